//! Drives a corpus through a corrector and assembles the report.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Local;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::accumulator::StatAccumulator;
use super::metrics::MetricsEngine;
use super::report::{DetailedResult, EvaluationReport, JsonReportWriter, ReportSink};
use crate::config::Config;
use crate::error::{EvalError, Result};
use crate::spell_check::{CorrectionError, CorrectionOutcome, Corrector};

/// Sentences between two progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Receives `(processed, total)` as sentences complete.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, processed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}

/// Reports progress through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, processed: usize, total: usize) {
        info!(processed, total, "Processed: {}/{}", processed, total);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// False positives assumed for precision; unobservable on this corpus.
    pub false_positives: usize,
    pub progress_interval: usize,
    /// Run `correct` on the rayon pool instead of one sentence at a time.
    pub parallel: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            false_positives: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            parallel: false,
        }
    }
}

impl From<&Config> for EvaluationOptions {
    fn from(config: &Config) -> Self {
        Self {
            false_positives: config.false_positives,
            progress_interval: config.progress_interval,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

/// Runs one full evaluation pass per call to [`Evaluator::run`].
///
/// Outcomes are folded into the accumulator and the detail list in corpus
/// order, also in parallel mode. Any failed sentence aborts the run and no
/// partial report is produced.
pub struct Evaluator<'c> {
    corrector: &'c dyn Corrector,
    model_id: String,
    model_name: Option<String>,
    options: EvaluationOptions,
    progress: Option<Box<dyn ProgressSink + 'c>>,
    report_sink: Option<Box<dyn ReportSink + 'c>>,
    state: RunState,
    saved_path: Option<PathBuf>,
}

impl<'c> Evaluator<'c> {
    pub fn new(corrector: &'c dyn Corrector, model_id: impl Into<String>) -> Self {
        Self {
            corrector,
            model_id: model_id.into(),
            model_name: None,
            options: EvaluationOptions::default(),
            progress: None,
            report_sink: None,
            state: RunState::NotStarted,
            saved_path: None,
        }
    }

    /// Options from `config`, writing reports into its results directory.
    pub fn from_config(
        corrector: &'c dyn Corrector,
        model_id: impl Into<String>,
        config: &Config,
    ) -> Self {
        Self::new(corrector, model_id)
            .with_options(EvaluationOptions::from(config))
            .with_report_sink(JsonReportWriter::new(&config.results_dir))
    }

    /// Display name recorded in the report; defaults to the model id.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'c) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    pub fn with_report_sink(mut self, sink: impl ReportSink + 'c) -> Self {
        self.report_sink = Some(Box::new(sink));
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Where the last report was written, if a sink stored it.
    pub fn saved_path(&self) -> Option<&Path> {
        self.saved_path.as_deref()
    }

    /// Evaluate `sentences` and return the report.
    ///
    /// An empty corpus produces an all-zero report without touching the
    /// corrector. A report that fails to persist is still returned.
    pub fn run(&mut self, sentences: &[String]) -> Result<EvaluationReport> {
        self.state = RunState::Running;
        self.saved_path = None;

        let report = match self.evaluate(sentences) {
            Ok(report) => report,
            Err(e) => {
                self.state = RunState::NotStarted;
                return Err(e);
            }
        };

        if let Some(sink) = &self.report_sink {
            match sink.persist(&report) {
                Ok(path) => self.saved_path = Some(path),
                Err(e) => warn!("Failed to save results, keeping report in memory: {}", e),
            }
        }

        self.state = RunState::Completed;
        Ok(report)
    }

    fn evaluate(&self, sentences: &[String]) -> Result<EvaluationReport> {
        let mut accumulator = StatAccumulator::new();
        let mut detailed_results = Vec::with_capacity(sentences.len());

        if sentences.is_empty() {
            warn!("Corpus is empty, nothing to evaluate");
        } else {
            self.corrector
                .load()
                .map_err(|source| EvalError::BackendInitialization {
                    model: self.model_id.clone(),
                    source,
                })?;

            info!(
                model = %self.model_id,
                total = sentences.len(),
                parallel = self.options.parallel,
                "Starting error detection"
            );

            if self.options.parallel {
                let outcomes = self.correct_parallel(sentences)?;
                for (index, outcome) in outcomes.into_iter().enumerate() {
                    accumulator.add(&outcome);
                    detailed_results.push(DetailedResult::new(index, outcome));
                }
            } else {
                for (index, sentence) in sentences.iter().enumerate() {
                    let outcome = self.correct_one(index, sentences.len(), sentence)?;
                    accumulator.add(&outcome);
                    detailed_results.push(DetailedResult::new(index, outcome));
                    self.notify(index + 1, sentences.len());
                }
            }
        }

        let metrics = MetricsEngine::new(&accumulator).compute_all(self.options.false_positives);
        debug!(?metrics, "Evaluation finished");

        Ok(EvaluationReport {
            model_identifier: self.model_id.clone(),
            model_name: self
                .model_name
                .clone()
                .unwrap_or_else(|| self.model_id.clone()),
            timestamp: Local::now(),
            metrics,
            detailed_results,
        })
    }

    fn correct_parallel(&self, sentences: &[String]) -> Result<Vec<CorrectionOutcome>> {
        let completed = AtomicUsize::new(0);
        let total = sentences.len();

        sentences
            .par_iter()
            .enumerate()
            .map(|(index, sentence)| {
                let outcome = self.correct_one(index, total, sentence)?;
                let processed = completed.fetch_add(1, Ordering::SeqCst) + 1;
                self.notify(processed, total);
                Ok(outcome)
            })
            .collect()
    }

    fn correct_one(&self, index: usize, total: usize, sentence: &str) -> Result<CorrectionOutcome> {
        self.corrector
            .correct(sentence)
            .map_err(|source: CorrectionError| EvalError::Inference {
                index,
                corpus_size: total,
                sentence: sentence.to_string(),
                source,
            })
    }

    fn notify(&self, processed: usize, total: usize) {
        let interval = self.options.progress_interval.max(1);
        if processed % interval != 0 {
            return;
        }
        if let Some(sink) = &self.progress {
            sink.on_progress(processed, total);
        }
    }
}
