//! Positive-only evaluation
//!
//! Every sentence of the corpus contains at least one error, so the only
//! question per sentence is whether the corrector flagged it.
//!
//! - `accumulator`: detected / total counts
//! - `metrics`: precision, recall and F-beta with zero-safe divisions
//! - `orchestrator`: runs a corpus through a corrector
//! - `report`: the resulting artifact and where it is written

pub mod accumulator;
pub mod metrics;
pub mod orchestrator;
pub mod report;

pub use accumulator::{DetectionFlag, StatAccumulator};
pub use metrics::{f_beta, precision, recall, MetricSet, MetricsEngine, F05_BETA, F1_BETA, F2_BETA};
pub use orchestrator::{
    EvaluationOptions, Evaluator, LogProgress, ProgressSink, RunState, DEFAULT_PROGRESS_INTERVAL,
};
pub use report::{DetailedResult, EvaluationReport, JsonReportWriter, ReportSink};
