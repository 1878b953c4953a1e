//! Corrector backed by a local LLM served by Ollama.
//!
//! The model only returns the corrected sentence, so edits are recovered by
//! diffing it against the input.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::errors::CorrectionError;
use super::model_manager::ModelManager;
use super::outcome::CorrectionOutcome;
use super::text_utils::{diff_edits, TextUtils};
use super::Corrector;

/// Default Ollama API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Request body for Ollama's `/api/generate` endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
}

/// Response from Ollama's `/api/generate` endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Response from Ollama's `/api/tags` endpoint.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub name: String,
}

impl TagsResponse {
    /// Whether `model` is pulled; a bare name also matches its `:latest` tag.
    pub fn has_model(&self, model: &str) -> bool {
        let latest = format!("{model}:latest");
        self.models
            .iter()
            .any(|m| m.name == model || m.name == latest)
    }
}

/// Build the correction prompt for one sentence.
pub fn correction_prompt(sentence: &str) -> String {
    format!(
        "请纠正下面句子中的错别字，不要改写句子，只输出纠正后的句子：«{}»",
        sentence
    )
}

/// HTTP plumbing created on first use
#[derive(Debug)]
struct OllamaSession {
    runtime: Runtime,
    client: reqwest::Client,
}

/// Corrector that asks an Ollama-served model to fix each sentence
#[derive(Debug)]
pub struct OllamaCorrector {
    name: String,
    model: String,
    manager: ModelManager<OllamaSession>,
}

impl OllamaCorrector {
    /// Create a corrector for `model` on the Ollama server at `base_url`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let base_url = base_url.into();
        Self {
            name: format!("Ollama-{model}"),
            model,
            manager: ModelManager::new(base_url.trim_end_matches('/')),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn base_url(&self) -> &str {
        self.manager.source()
    }

    fn session(&self) -> Result<&OllamaSession, CorrectionError> {
        self.manager.load_with(|base_url| {
            let load_failed = |details: String| CorrectionError::ModelLoadFailed {
                path: base_url.to_string(),
                details,
            };

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .map_err(|e| load_failed(format!("failed to start runtime: {e}")))?;

            let client = reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| load_failed(e.to_string()))?;

            let tags = runtime
                .block_on(fetch_tags(&client, base_url))
                .map_err(|e| load_failed(e.to_string()))?;

            if !tags.has_model(&self.model) {
                return Err(load_failed(format!(
                    "model '{}' is not available; run `ollama pull {}`",
                    self.model, self.model
                )));
            }

            info!(model = %self.model, "Ollama model available");
            Ok(OllamaSession { runtime, client })
        })
    }

    async fn generate(
        &self,
        client: &reqwest::Client,
        sentence: &str,
    ) -> Result<GenerateResponse, CorrectionError> {
        let url = format!("{}/api/generate", self.base_url());
        let request = GenerateRequest {
            model: &self.model,
            prompt: correction_prompt(sentence),
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CorrectionError::Http {
                details: format!("Ollama API returned {}: {}", status, body),
            });
        }

        Ok(response.json().await?)
    }
}

async fn fetch_tags(client: &reqwest::Client, base_url: &str) -> Result<TagsResponse, CorrectionError> {
    let url = format!("{base_url}/api/tags");
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(CorrectionError::Http {
            details: format!("Ollama API returned status {}", response.status()),
        });
    }

    Ok(response.json().await?)
}

impl Corrector for OllamaCorrector {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<(), CorrectionError> {
        self.session().map(|_| ())
    }

    fn is_loaded(&self) -> bool {
        self.manager.is_loaded()
    }

    fn correct(&self, sentence: &str) -> Result<CorrectionOutcome, CorrectionError> {
        let session = self.session()?;
        let generated = session
            .runtime
            .block_on(self.generate(&session.client, sentence))?;

        let corrected = TextUtils::post_process_text(&generated.response, sentence);
        let edits = diff_edits(sentence, &corrected);
        debug!(edits = edits.len(), "Ollama corrected '{}' -> '{}'", sentence, corrected);

        Ok(CorrectionOutcome::from_edits(sentence, corrected, edits))
    }
}
