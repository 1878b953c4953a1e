//! Correction backends
//!
//! Every backend implements [`Corrector`]: one initializer (`load`) and one
//! per-sentence operation (`correct`). The evaluator only ever talks to this
//! trait, never to a model library directly.
//!
//! - `outcome`: the normalized per-sentence result and its edit records
//! - `errors`: structured error types for backend failures
//! - `model_manager`: lazy, idempotent model loading shared by backends
//! - `text_utils`: output clean-up and edit extraction
//! - `confusion`: confusion-dictionary backend
//! - `ollama`: local LLM backend served by Ollama

pub mod confusion;
pub mod errors;
pub mod model_manager;
pub mod ollama;
pub mod outcome;
pub mod text_utils;

use rayon::prelude::*;

pub use confusion::ConfusionCorrector;
pub use errors::CorrectionError;
pub use model_manager::ModelManager;
pub use ollama::OllamaCorrector;
pub use outcome::{CorrectionOutcome, Edit, EditPosition};

/// A spelling/grammar correction capability.
///
/// `load` must be idempotent, and `correct` must load on first use rather
/// than fail. A failed `correct` is returned to the caller as-is; it must
/// never be reported as "no error detected".
#[cfg_attr(test, mockall::automock)]
pub trait Corrector: Send + Sync {
    /// Human-readable model name
    fn name(&self) -> String;

    /// Initialize the backend. A second call is a no-op.
    fn load(&self) -> Result<(), CorrectionError>;

    fn is_loaded(&self) -> bool;

    /// Correct a single sentence, loading the backend if needed
    fn correct(&self, sentence: &str) -> Result<CorrectionOutcome, CorrectionError>;

    /// Correct sentences one after another, in order
    fn correct_batch(&self, sentences: &[String]) -> Result<Vec<CorrectionOutcome>, CorrectionError> {
        self.load()?;
        sentences.iter().map(|sentence| self.correct(sentence)).collect()
    }

    /// Correct sentences on the rayon pool; results keep input order
    fn correct_batch_parallel(
        &self,
        sentences: &[String],
    ) -> Result<Vec<CorrectionOutcome>, CorrectionError> {
        self.load()?;
        sentences
            .par_iter()
            .map(|sentence| self.correct(sentence))
            .collect()
    }

    /// Whether the backend flags `sentence` as containing an error
    fn detect_error(&self, sentence: &str) -> Result<bool, CorrectionError> {
        Ok(self.correct(sentence)?.has_error_detected)
    }

    fn detect_batch(&self, sentences: &[String]) -> Result<Vec<bool>, CorrectionError> {
        sentences
            .iter()
            .map(|sentence| self.detect_error(sentence))
            .collect()
    }
}
