//! Sequential batch resolution over a JSON dataset.
//!
//! Dataset format: a JSON array of
//! `{"label": str, "extraction_schema": {field: description}, "pdf_path": str}`.
//! Only the file name of `pdf_path` is used; the document is looked up in
//! the data directory. Bad records are skipped, never fatal.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::document::FileDocument;
use super::orchestrator::Orchestrator;
use super::types::{FieldSource, ResolutionResult, Schema};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Dataset unreadable at {path}: {reason}")]
    DatasetUnreadable { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════
// Dataset
// ═══════════════════════════════════════════

/// A validated dataset record.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRecord {
    pub label: String,
    pub schema: Schema,
    pub pdf_path: String,
}

impl DatasetRecord {
    /// Validate one raw dataset entry. The error is a human-readable reason.
    pub fn from_value(raw: &Value) -> Result<Self, String> {
        let object = raw.as_object().ok_or("record is not an object")?;

        let label = object
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or("missing label")?;

        let pdf_path = object
            .get("pdf_path")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or("missing pdf_path")?;

        let fields = object
            .get("extraction_schema")
            .and_then(Value::as_object)
            .filter(|s| !s.is_empty())
            .ok_or("missing extraction_schema")?;

        let mut schema = Schema::new();
        for (field, description) in fields {
            let description = match description {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            schema.insert(field.clone(), description);
        }

        Ok(Self {
            label: label.to_string(),
            schema,
            pdf_path: pdf_path.to_string(),
        })
    }

    /// Location of the document: the record's file name inside `data_dir`.
    pub fn resolve_path(&self, data_dir: &Path) -> Option<PathBuf> {
        Path::new(&self.pdf_path)
            .file_name()
            .map(|name| data_dir.join(name))
    }
}

/// Read the dataset array. The only fatal batch error.
pub fn load_dataset(path: &Path) -> Result<Vec<Value>, BatchError> {
    let unreadable = |reason: String| BatchError::DatasetUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| unreadable(e.to_string()))?;
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(unreadable("top-level value is not an array".into())),
    }
}

// ═══════════════════════════════════════════
// Report
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemReport {
    pub file: String,
    pub label: String,
    pub result: ResolutionResult,
    pub sources: BTreeMap<String, FieldSource>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub items: Vec<BatchItemReport>,
    pub skipped: Vec<SkippedRecord>,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), BatchError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════

/// Runs the orchestrator over every dataset record, one at a time.
pub struct BatchRunner {
    orchestrator: Orchestrator,
    data_dir: PathBuf,
}

impl BatchRunner {
    pub fn new(orchestrator: Orchestrator, data_dir: &Path) -> Self {
        Self {
            orchestrator,
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Process the dataset at `dataset_path`, calling `on_item` after each
    /// resolved document.
    pub fn run<F>(&self, dataset_path: &Path, mut on_item: F) -> Result<BatchReport, BatchError>
    where
        F: FnMut(&BatchItemReport),
    {
        let records = load_dataset(dataset_path)?;
        let mut report = BatchReport::new();
        tracing::info!(
            run_id = %report.run_id,
            records = records.len(),
            data_dir = %self.data_dir.display(),
            "Batch started"
        );

        for (index, raw) in records.iter().enumerate() {
            match self.process(raw) {
                Ok(item) => {
                    on_item(&item);
                    report.items.push(item);
                }
                Err(reason) => {
                    tracing::warn!(index, reason = %reason, "Skipping dataset record");
                    report.skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        tracing::info!(
            run_id = %report.run_id,
            processed = report.items.len(),
            skipped = report.skipped.len(),
            "Batch finished"
        );
        Ok(report)
    }

    fn process(&self, raw: &Value) -> Result<BatchItemReport, String> {
        let record = DatasetRecord::from_value(raw)?;
        let path = record
            .resolve_path(&self.data_dir)
            .ok_or_else(|| format!("pdf_path has no file name: {}", record.pdf_path))?;

        let document = FileDocument::open(&path).map_err(|e| e.to_string())?;

        let start = Instant::now();
        let resolution = self.orchestrator.resolve(&record.label, &document, &record.schema);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let file = document
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(file = %file, label = %record.label, elapsed_ms, "Document resolved");

        Ok(BatchItemReport {
            file,
            label: record.label,
            result: resolution.values,
            sources: resolution.sources,
            elapsed_ms,
        })
    }
}
