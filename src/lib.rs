//! Positive-only evaluation of Chinese spelling correction models.
//!
//! A corpus in which every sentence is known to contain an error is run
//! through a [`Corrector`]; the share of sentences it flags gives recall, and
//! precision and F-beta follow from a caller-supplied false-positive count.
//!
//! ```no_run
//! use csc_eval::{ConfusionCorrector, Evaluator};
//!
//! let corrector = ConfusionCorrector::builtin();
//! let sentences = vec!["今天天汽很好".to_string()];
//! let report = Evaluator::new(&corrector, "confusion").run(&sentences)?;
//! println!("{}", report.summary());
//! # Ok::<(), csc_eval::EvalError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod spell_check;

pub use config::{BackendKind, Config, ModelSpec};
pub use data::CorpusLoader;
pub use error::{EvalError, Result};
pub use evaluation::{
    DetailedResult, EvaluationOptions, EvaluationReport, Evaluator, JsonReportWriter, LogProgress,
    MetricSet, MetricsEngine, ProgressSink, ReportSink, RunState, StatAccumulator,
};
pub use spell_check::{
    ConfusionCorrector, CorrectionError, CorrectionOutcome, Corrector, Edit, EditPosition,
    OllamaCorrector,
};
