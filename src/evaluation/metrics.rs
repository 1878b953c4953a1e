//! Precision, recall and F-beta under the positive-only assumption.
//!
//! With no negative sentences in the corpus, true positives and false
//! negatives come from the accumulator while false positives must be
//! supplied by the caller (0 unless known). Every division by zero yields
//! exactly `0.0`:
//!
//! - recall is `0.0` for an empty corpus
//! - precision is `0.0` when `TP + FP == 0`, so `TP = 0, FP = 0` gives
//!   `0.0`, never `1.0`
//! - F-beta is `0.0` when precision and recall are both zero
//!
//! No rounding happens here; display rounding lives in [`MetricSet`]'s
//! `Display` impl.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::accumulator::StatAccumulator;

/// Precision-weighted F-score.
pub const F05_BETA: f64 = 0.5;
/// Balanced F-score.
pub const F1_BETA: f64 = 1.0;
/// Recall-weighted F-score.
pub const F2_BETA: f64 = 2.0;

/// `TP / (TP + FN)`, or `0.0` when there is nothing to recall.
pub fn recall(true_positive: usize, false_negative: usize) -> f64 {
    let total = true_positive + false_negative;
    if total == 0 {
        return 0.0;
    }
    true_positive as f64 / total as f64
}

/// `TP / (TP + FP)`, or `0.0` when nothing was flagged at all.
pub fn precision(true_positive: usize, false_positive: usize) -> f64 {
    let flagged = true_positive + false_positive;
    if flagged == 0 {
        return 0.0;
    }
    true_positive as f64 / flagged as f64
}

/// Weighted harmonic mean of precision and recall.
///
/// `beta < 1` favours precision, `beta > 1` favours recall.
pub fn f_beta(precision: f64, recall: f64, beta: f64) -> f64 {
    if precision + recall <= 0.0 {
        return 0.0;
    }
    let beta_squared = beta * beta;
    (1.0 + beta_squared) * (precision * recall) / (beta_squared * precision + recall)
}

/// Derives metrics from an accumulator's counts.
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine<'a> {
    accumulator: &'a StatAccumulator,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(accumulator: &'a StatAccumulator) -> Self {
        Self { accumulator }
    }

    pub fn true_positive(&self) -> usize {
        self.accumulator.count_detected()
    }

    pub fn false_negative(&self) -> usize {
        self.accumulator.count_undetected()
    }

    pub fn recall(&self) -> f64 {
        recall(self.true_positive(), self.false_negative())
    }

    pub fn precision(&self, false_positive: usize) -> f64 {
        precision(self.true_positive(), false_positive)
    }

    pub fn f_beta(&self, beta: f64, false_positive: usize) -> f64 {
        f_beta(self.precision(false_positive), self.recall(), beta)
    }

    pub fn f05(&self, false_positive: usize) -> f64 {
        self.f_beta(F05_BETA, false_positive)
    }

    pub fn f1(&self, false_positive: usize) -> f64 {
        self.f_beta(F1_BETA, false_positive)
    }

    pub fn f2(&self, false_positive: usize) -> f64 {
        self.f_beta(F2_BETA, false_positive)
    }

    /// Every metric in one fixed-shape record.
    pub fn compute_all(&self, false_positive: usize) -> MetricSet {
        MetricSet {
            total_sentences: self.accumulator.count_total(),
            true_positive: self.true_positive(),
            false_negative: self.false_negative(),
            false_positive,
            precision: self.precision(false_positive),
            recall: self.recall(),
            f0_5: self.f05(false_positive),
            f1: self.f1(false_positive),
            f2: self.f2(false_positive),
        }
    }
}

/// The complete metric record of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub total_sentences: usize,
    pub true_positive: usize,
    pub false_negative: usize,
    pub false_positive: usize,
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f0.5")]
    pub f0_5: f64,
    pub f1: f64,
    pub f2: f64,
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Evaluation summary")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total sentences: {}", self.total_sentences)?;
        writeln!(f, "Detected (TP): {}", self.true_positive)?;
        writeln!(f, "Missed (FN): {}", self.false_negative)?;
        writeln!(f, "False positives (FP): {}", self.false_positive)?;
        writeln!(f, "{}", "-".repeat(50))?;
        writeln!(f, "Precision: {:.4}", self.precision)?;
        writeln!(f, "Recall: {:.4}", self.recall)?;
        writeln!(f, "F0.5: {:.4}", self.f0_5)?;
        writeln!(f, "F1: {:.4}", self.f1)?;
        writeln!(f, "F2: {:.4}", self.f2)?;
        write!(f, "{rule}")
    }
}
