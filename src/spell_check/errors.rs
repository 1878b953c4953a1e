/// Errors that can occur inside a correction backend
#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    #[error("Model file not found: {path}")]
    ModelNotFound { path: String },

    #[error("Failed to load model from {path}: {details}")]
    ModelLoadFailed { path: String, details: String },

    #[error("Model not loaded - call load() first")]
    ModelNotLoaded,

    #[error("Inference failed: {details}")]
    InferenceFailed { details: String },

    #[error("Failed to decode model output: {details}")]
    DecodingFailed { details: String },

    #[error("HTTP request failed: {details}")]
    Http { details: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for CorrectionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CorrectionError::DecodingFailed {
                details: err.to_string(),
            }
        } else {
            CorrectionError::Http {
                details: err.to_string(),
            }
        }
    }
}
