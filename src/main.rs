//! Docfields CLI
//!
//! - `batch`: resolve every record of a dataset file
//! - `resolve`: resolve one document against a schema given on the command line

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use thiserror::Error;

use docfields::config;
use docfields::pipeline::batch::{BatchError, BatchReport, BatchRunner};
use docfields::pipeline::cache::CacheStore;
use docfields::pipeline::document::{DocumentError, FileDocument};
use docfields::pipeline::generative::build_backend;
use docfields::pipeline::{Orchestrator, Schema};
use docfields::pipeline_config::{PipelineConfig, Provider};

#[derive(Parser)]
#[command(name = "docfields")]
#[command(author, version, about = "Resolve field schemas against documents")]
struct Cli {
    #[command(flatten)]
    pipeline: PipelineArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the environment-derived pipeline configuration.
#[derive(Args)]
struct PipelineArgs {
    /// Cache store file (default: $DOCFIELDS_CACHE_PATH or ./cache_db.json)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Generative provider: openai, ollama or none
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name passed to the provider
    #[arg(long, global = true)]
    model: Option<String>,

    /// Provider base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every record of a dataset, printing each result as JSON.
    Batch {
        /// Dataset file (JSON array of {label, extraction_schema, pdf_path})
        #[arg(long, default_value_os_t = config::default_dataset_path())]
        dataset: PathBuf,

        /// Directory the documents are looked up in
        #[arg(long, default_value = config::DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Write the full batch report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Resolve a single document.
    Resolve {
        /// Document label (selects template rules)
        #[arg(long)]
        label: String,

        /// Schema as a JSON object: {"field": "description", ...}
        #[arg(long)]
        schema: String,

        /// Document file
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid --schema: {0}")]
    Schema(String),

    #[error("Unknown provider: {0}")]
    Provider(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    docfields::init_tracing();
    let cli = Cli::parse();

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = apply_overrides(PipelineConfig::from_env(), &cli.pipeline)?;
    tracing::debug!(
        provider = ?config.backend.provider,
        model = %config.backend.model,
        cache = %config.cache_path.display(),
        "Pipeline configuration"
    );

    let store = Arc::new(CacheStore::load(&config.cache_path));
    let orchestrator = Orchestrator::with_store(store, build_backend(&config.backend));

    match cli.command {
        Commands::Batch {
            dataset,
            data_dir,
            output,
        } => {
            let runner = BatchRunner::new(orchestrator, &data_dir);
            let report = runner.run(&dataset, |item| {
                let line = json!({
                    "file": item.file,
                    "label": item.label,
                    "result": item.result,
                    "elapsed_ms": item.elapsed_ms,
                });
                match serde_json::to_string_pretty(&line) {
                    Ok(text) => println!("{text}"),
                    Err(e) => tracing::warn!(error = %e, "Cannot print result"),
                }
            })?;

            if let Some(path) = output {
                write_report(&report, &path);
            }
            Ok(())
        }
        Commands::Resolve { label, schema, file } => {
            let schema: Schema =
                serde_json::from_str(&schema).map_err(|e| CliError::Schema(e.to_string()))?;
            let document = FileDocument::open(&file)?;
            let resolution = orchestrator.resolve(&label, &document, &schema);
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(())
        }
    }
}

/// Results were already printed, so a failed report write only warns.
fn write_report(report: &BatchReport, path: &Path) -> bool {
    match report.write_to(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Batch report written");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot write batch report");
            false
        }
    }
}

fn apply_overrides(mut config: PipelineConfig, args: &PipelineArgs) -> Result<PipelineConfig, CliError> {
    if let Some(path) = &args.cache {
        config.cache_path = path.clone();
    }
    if let Some(raw) = &args.provider {
        let provider = Provider::from_str(raw).ok_or_else(|| CliError::Provider(raw.clone()))?;
        if provider != config.backend.provider && args.base_url.is_none() {
            config.backend.base_url = provider.default_base_url().to_string();
        }
        config.backend.provider = provider;
    }
    if let Some(model) = &args.model {
        config.backend.model = model.clone();
    }
    if let Some(url) = &args.base_url {
        config.backend.base_url = url.clone();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfields::pipeline::generative::DisabledBackend;
    use tempfile::TempDir;

    fn empty_report(dir: &Path) -> BatchReport {
        let dataset = dir.join("dataset.json");
        std::fs::write(&dataset, "[]").unwrap();
        let store = Arc::new(CacheStore::in_memory());
        let runner = BatchRunner::new(Orchestrator::with_store(store, Box::new(DisabledBackend)), dir);
        runner.run(&dataset, |_| {}).unwrap()
    }

    #[test]
    fn report_write_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let report = empty_report(dir.path());
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        assert!(!write_report(&report, &blocker.join("report.json")));
        assert!(write_report(&report, &dir.path().join("report.json")));
    }
}
