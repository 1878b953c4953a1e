use std::path::PathBuf;

use crate::spell_check::CorrectionError;

/// Errors that abort an evaluation.
///
/// Metric edge cases are not errors: divisions by zero yield `0.0`.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported corpus format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Unknown model '{model}' (available: {available})")]
    UnknownModel { model: String, available: String },

    #[error("Failed to initialize model '{model}': {source}")]
    BackendInitialization {
        model: String,
        #[source]
        source: CorrectionError,
    },

    #[error("Correction failed for sentence {index} of {corpus_size} ('{sentence}'): {source}")]
    Inference {
        index: usize,
        corpus_size: usize,
        sentence: String,
        #[source]
        source: CorrectionError,
    },

    #[error("Failed to write report to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml_edit::TomlError),
}

impl EvalError {
    /// Whether the error happened before any sentence was processed.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            EvalError::Configuration(_)
                | EvalError::UnsupportedFormat { .. }
                | EvalError::UnknownModel { .. }
                | EvalError::BackendInitialization { .. }
                | EvalError::Toml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_carries_reproduction_context() {
        let error = EvalError::Inference {
            index: 41,
            corpus_size: 1000,
            sentence: "今天天汽很好".to_string(),
            source: CorrectionError::InferenceFailed {
                details: "timeout".to_string(),
            },
        };

        let message = error.to_string();
        assert!(message.contains("41"));
        assert!(message.contains("1000"));
        assert!(message.contains("今天天汽很好"));
        assert!(message.contains("timeout"));
        assert!(!error.is_setup_error());
    }

    #[test]
    fn test_setup_errors() {
        let unknown = EvalError::UnknownModel {
            model: "bert".to_string(),
            available: "confusion, qwen-ollama".to_string(),
        };
        assert!(unknown.is_setup_error());
        assert!(unknown.to_string().contains("confusion, qwen-ollama"));

        let init = EvalError::BackendInitialization {
            model: "qwen-ollama".to_string(),
            source: CorrectionError::ModelNotLoaded,
        };
        assert!(init.is_setup_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = EvalError::from(io_error);
        assert!(matches!(error, EvalError::Io(_)));
    }
}
