use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Where an edit applies in the original sentence, counted in characters.
///
/// Some backends report what they changed but not where. That case is a
/// variant of its own instead of a magic index; on the wire it is `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditPosition {
    Known(usize),
    Unknown,
}

impl EditPosition {
    /// Wire representation: the index, or `-1` when unknown.
    pub fn as_i64(&self) -> i64 {
        match self {
            EditPosition::Known(index) => *index as i64,
            EditPosition::Unknown => -1,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            EditPosition::Known(index) => Some(*index),
            EditPosition::Unknown => None,
        }
    }
}

impl Serialize for EditPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for EditPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        match raw {
            -1 => Ok(EditPosition::Unknown),
            index if index >= 0 => Ok(EditPosition::Known(index as usize)),
            other => Err(serde::de::Error::custom(format!(
                "edit position must be >= -1, got {other}"
            ))),
        }
    }
}

/// A single replacement made by a corrector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub position: EditPosition,
    pub original_char: String,
    pub corrected_char: String,
}

impl Edit {
    pub fn new(
        position: EditPosition,
        original_char: impl Into<String>,
        corrected_char: impl Into<String>,
    ) -> Self {
        Self {
            position,
            original_char: original_char.into(),
            corrected_char: corrected_char.into(),
        }
    }

    /// An edit at a known character index of the original sentence.
    pub fn at(index: usize, original_char: impl Into<String>, corrected_char: impl Into<String>) -> Self {
        Self::new(EditPosition::Known(index), original_char, corrected_char)
    }

    /// An edit from a backend that cannot localize its changes.
    pub fn unlocated(original_char: impl Into<String>, corrected_char: impl Into<String>) -> Self {
        Self::new(EditPosition::Unknown, original_char, corrected_char)
    }
}

/// The normalized result of running one sentence through a corrector.
///
/// `has_error_detected` is stored rather than derived so that detection-only
/// backends can flag a sentence without localizing anything. Backends that do
/// produce edits should build outcomes with [`CorrectionOutcome::from_edits`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub original: String,
    pub corrected: String,
    pub has_error_detected: bool,
    pub edits: Vec<Edit>,
}

impl CorrectionOutcome {
    /// Builds an outcome whose detection flag is `!edits.is_empty()`.
    pub fn from_edits(
        original: impl Into<String>,
        corrected: impl Into<String>,
        edits: Vec<Edit>,
    ) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
            has_error_detected: !edits.is_empty(),
            edits,
        }
    }

    /// An outcome for a sentence judged correct: nothing changed.
    pub fn unchanged(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            corrected: original.clone(),
            original,
            has_error_detected: false,
            edits: Vec::new(),
        }
    }

    /// An outcome from a detector that has a verdict but no edits.
    pub fn detected_only(original: impl Into<String>, has_error_detected: bool) -> Self {
        Self {
            has_error_detected,
            ..Self::unchanged(original)
        }
    }
}
