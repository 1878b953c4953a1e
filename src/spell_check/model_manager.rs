use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::errors::CorrectionError;

/// Manages lazy, one-time loading of a backend's model state.
///
/// Loading happens at most once; later calls return the cached model. A
/// failed load leaves the manager empty so the error surfaces again on the
/// next attempt instead of being cached.
#[derive(Debug)]
pub struct ModelManager<M> {
    source: String,
    model: OnceCell<M>,
}

impl<M> ModelManager<M> {
    /// Create a manager for a model loaded from `source` (a path or URL)
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            model: OnceCell::new(),
        }
    }

    /// Load the model with `init` unless it is already loaded
    pub fn load_with<F>(&self, init: F) -> Result<&M, CorrectionError>
    where
        F: FnOnce(&str) -> Result<M, CorrectionError>,
    {
        if let Some(model) = self.model.get() {
            debug!(source = %self.source, "Model already loaded");
            return Ok(model);
        }

        self.model.get_or_try_init(|| {
            info!(source = %self.source, "Loading model");
            let model = init(&self.source)?;
            info!(source = %self.source, "Model loaded successfully");
            Ok(model)
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Get reference to loaded model
    pub fn model(&self) -> Result<&M, CorrectionError> {
        self.model.get().ok_or(CorrectionError::ModelNotLoaded)
    }

    /// Where the model is loaded from
    pub fn source(&self) -> &str {
        &self.source
    }
}
