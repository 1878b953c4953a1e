use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use csc_eval::config::DEFAULT_CONFIG_FILE;
use csc_eval::{Config, CorpusLoader, EvaluationOptions, Evaluator, JsonReportWriter, LogProgress};

#[derive(Parser)]
#[command(
    name = "csc-eval",
    about = "Positive-only evaluation of Chinese spelling correction models"
)]
#[command(version)]
struct Cli {
    /// Corpus file (.txt, .json or .jsonl); every sentence must contain an error
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Model id from the registry (defaults to the configured default_model)
    #[arg(short, long)]
    model: Option<String>,

    /// Config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// False positives to assume when computing precision
    #[arg(long)]
    false_positives: Option<usize>,

    /// Correct sentences on a thread pool
    #[arg(long)]
    parallel: bool,

    /// Do not write the JSON report
    #[arg(long)]
    no_save: bool,

    /// List registered models and exit
    #[arg(long)]
    list_models: bool,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if cli.list_models {
        for (id, spec) in &config.models {
            println!("{:<16} {} - {}", id, spec.name, spec.description);
        }
        return Ok(());
    }

    let model_id = cli
        .model
        .clone()
        .unwrap_or_else(|| config.default_model.clone());
    let corrector = config.build_corrector(&model_id)?;

    let loader = CorpusLoader::new();
    let sentences = match &cli.file {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load corpus from {}", path.display()))?,
        None => loader.load_from_list(Vec::<String>::new()),
    };

    if sentences.is_empty() {
        warn!("No sentences to evaluate, pass a corpus with --file");
        return Ok(());
    }

    let mut options = EvaluationOptions::from(&config);
    if let Some(false_positives) = cli.false_positives {
        options.false_positives = false_positives;
    }
    options.parallel = cli.parallel;

    info!(
        "Evaluating {} ({}) on {} sentences",
        model_id,
        corrector.name(),
        sentences.len()
    );

    let mut evaluator = Evaluator::new(corrector.as_ref(), model_id.clone())
        .with_model_name(corrector.name())
        .with_options(options);
    if !cli.quiet {
        evaluator = evaluator.with_progress(LogProgress);
    }
    if !cli.no_save {
        if let Err(e) = config.ensure_output_dirs() {
            warn!("Could not create output directories: {}", e);
        }
        evaluator = evaluator.with_report_sink(JsonReportWriter::new(&config.results_dir));
    }

    let report = evaluator.run(&sentences)?;

    if !cli.quiet {
        println!("{}", report.summary());
    }
    if let Some(path) = evaluator.saved_path() {
        println!("Results saved to: {}", path.display());
    }

    Ok(())
}
