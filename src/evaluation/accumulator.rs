//! Running detection counts over a positive-only corpus.

use crate::spell_check::CorrectionOutcome;

/// Anything that carries a detected / not-detected verdict.
pub trait DetectionFlag {
    fn detected(&self) -> bool;
}

impl DetectionFlag for bool {
    fn detected(&self) -> bool {
        *self
    }
}

impl DetectionFlag for CorrectionOutcome {
    fn detected(&self) -> bool {
        self.has_error_detected
    }
}

impl<T: DetectionFlag + ?Sized> DetectionFlag for &T {
    fn detected(&self) -> bool {
        (**self).detected()
    }
}

/// Counts detected and undetected sentences.
///
/// Every sentence in the corpus is known to be erroneous, so a detection is
/// a true positive and a miss is a false negative. False positives cannot be
/// observed here and are supplied when metrics are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatAccumulator {
    count_detected: usize,
    count_total: usize,
}

impl StatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sentence's verdict.
    pub fn add<F: DetectionFlag>(&mut self, flag: F) {
        self.count_total += 1;
        if flag.detected() {
            self.count_detected += 1;
        }
    }

    /// Record verdicts in iteration order.
    pub fn add_many<I>(&mut self, flags: I)
    where
        I: IntoIterator,
        I::Item: DetectionFlag,
    {
        for flag in flags {
            self.add(flag);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True positives: sentences flagged as erroneous.
    pub fn count_detected(&self) -> usize {
        self.count_detected
    }

    /// False negatives: sentences the corrector missed.
    pub fn count_undetected(&self) -> usize {
        self.count_total - self.count_detected
    }

    pub fn count_total(&self) -> usize {
        self.count_total
    }

    pub fn is_empty(&self) -> bool {
        self.count_total == 0
    }
}

impl<F: DetectionFlag> Extend<F> for StatAccumulator {
    fn extend<I: IntoIterator<Item = F>>(&mut self, iter: I) {
        self.add_many(iter);
    }
}

impl<F: DetectionFlag> FromIterator<F> for StatAccumulator {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut accumulator = Self::new();
        accumulator.add_many(iter);
        accumulator
    }
}
