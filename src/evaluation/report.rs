//! The final evaluation artifact and its persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::metrics::MetricSet;
use crate::error::{EvalError, Result};
use crate::spell_check::{CorrectionOutcome, Edit};

/// Per-sentence entry of a report, in corpus order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedResult {
    pub index: usize,
    pub original: String,
    pub corrected: String,
    pub detected: bool,
    pub edits: Vec<Edit>,
}

impl DetailedResult {
    pub fn new(index: usize, outcome: CorrectionOutcome) -> Self {
        Self {
            index,
            original: outcome.original,
            corrected: outcome.corrected,
            detected: outcome.has_error_detected,
            edits: outcome.edits,
        }
    }
}

/// Result of one full evaluation pass.
///
/// `model_identifier` is the registry id and names the report file;
/// `model_name` is the corrector's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model_identifier: String,
    pub model_name: String,
    pub timestamp: DateTime<Local>,
    pub metrics: MetricSet,
    pub detailed_results: Vec<DetailedResult>,
}

impl EvaluationReport {
    /// Human-readable metric summary, rounded for display.
    pub fn summary(&self) -> String {
        self.metrics.to_string()
    }

    /// Sentences the corrector failed to flag.
    pub fn missed(&self) -> impl Iterator<Item = &DetailedResult> {
        self.detailed_results.iter().filter(|result| !result.detected)
    }
}

/// Destination for finished reports.
pub trait ReportSink: Send + Sync {
    /// Store the report, returning where it went.
    fn persist(&self, report: &EvaluationReport) -> Result<PathBuf>;
}

/// Writes reports as pretty-printed JSON files.
///
/// Files are named `{model}_results_{YYYYmmdd_HHMMSS}.json`. Non-ASCII text
/// is written verbatim and metric values keep full precision.
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    results_dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Path a report for `model_id` created at `timestamp` is written to.
    pub fn report_path(&self, model_id: &str, timestamp: &DateTime<Local>) -> PathBuf {
        let file_model: String = model_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.results_dir.join(format!(
            "{}_results_{}.json",
            file_model,
            timestamp.format("%Y%m%d_%H%M%S")
        ))
    }
}

impl ReportSink for JsonReportWriter {
    fn persist(&self, report: &EvaluationReport) -> Result<PathBuf> {
        let path = self.report_path(&report.model_identifier, &report.timestamp);
        let persistence = |source: std::io::Error| EvalError::Persistence {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.results_dir).map_err(persistence)?;
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(persistence)?;

        info!("Results saved to: {}", path.display());
        Ok(path)
    }
}
