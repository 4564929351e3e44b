//! JSON-backed cache store holding both the hash and template caches.
//!
//! Layout on disk:
//! ```text
//! { "hash_cache":     { "<key>": { field: value, ... } },
//!   "template_cache": { "<label>": { field: rule, ... } } }
//! ```
//! The whole file is rewritten after every mutation. Mutation and
//! persistence happen under one lock, so concurrent callers are serialized.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::rules::TemplateRule;
use super::traits::{HashCache, TemplateCache};
use super::CacheError;
use crate::pipeline::types::{FieldMap, ResolutionResult, Schema, StageOutput};

/// Label → field → learned rule.
pub type TemplateTable = BTreeMap<String, BTreeMap<String, TemplateRule>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    #[serde(default)]
    pub hash_cache: BTreeMap<String, ResolutionResult>,
    #[serde(default)]
    pub template_cache: TemplateTable,
}

pub struct CacheStore {
    /// `None` keeps everything in memory (tests, dry runs).
    path: Option<PathBuf>,
    data: Mutex<CacheData>,
}

impl CacheStore {
    /// Load the store from `path`. A missing file starts empty; an
    /// unreadable or corrupt file is logged and also starts empty.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<CacheData>(&raw) {
                Ok(data) => {
                    tracing::info!(
                        path = %path.display(),
                        hash_entries = data.hash_cache.len(),
                        template_labels = data.template_cache.len(),
                        "Cache store loaded"
                    );
                    data
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cache store is corrupt, starting empty");
                    CacheData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No cache store yet, starting empty");
                CacheData::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read cache store, starting empty");
                CacheData::default()
            }
        };

        Self {
            path: Some(path.to_path_buf()),
            data: Mutex::new(data),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(CacheData::default()),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> CacheData {
        self.lock().clone()
    }

    pub fn hash_entry_count(&self) -> usize {
        self.lock().hash_cache.len()
    }

    /// Stored rule for one (label, field), if any.
    pub fn template_rule(&self, label: &str, field: &str) -> Option<TemplateRule> {
        self.lock()
            .template_cache
            .get(label)
            .and_then(|rules| rules.get(field))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, CacheData> {
        // A panic while holding the lock leaves the maps consistent
        // (every mutation is a single insert), so keep using them.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rewrite the whole store. Writes a sibling temp file then renames it
    /// over the target so readers never see a half-written file.
    fn persist(&self, data: &CacheData) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn persist_logged(&self, data: &CacheData, operation: &str) {
        if let Err(e) = self.persist(data) {
            tracing::warn!(
                operation,
                error = %e,
                "Failed to persist cache store, keeping in-memory state"
            );
        }
    }
}

impl HashCache for CacheStore {
    fn lookup(&self, key: &str) -> Option<ResolutionResult> {
        self.lock().hash_cache.get(key).cloned()
    }

    fn store(&self, key: &str, result: &ResolutionResult) {
        let mut data = self.lock();
        if data.hash_cache.contains_key(key) {
            tracing::debug!(key = %short_key(key), "Hash entry already present, not overwriting");
            return;
        }

        tracing::info!(key = %short_key(key), "Saving result to hash cache");
        data.hash_cache.insert(key.to_string(), result.clone());
        self.persist_logged(&data, "hash_store");
    }
}

impl TemplateCache for CacheStore {
    fn lookup_rules(&self, label: &str, text: &str, schema: &Schema) -> StageOutput {
        let data = self.lock();

        let Some(label_rules) = data.template_cache.get(label).filter(|_| !label.is_empty()) else {
            tracing::debug!(label, "No template rules for label");
            return StageOutput {
                found: FieldMap::new(),
                remaining: schema.clone(),
            };
        };

        let mut output = StageOutput::default();
        for (field, description) in schema {
            match label_rules.get(field) {
                Some(rule) if rule.validate(text) => {
                    tracing::debug!(label, field = %field, "Template rule accepted");
                    output.found.insert(field.clone(), rule.to_value());
                }
                Some(_) => {
                    tracing::debug!(label, field = %field, "Template rule failed validation");
                    output.remaining.insert(field.clone(), description.clone());
                }
                None => {
                    output.remaining.insert(field.clone(), description.clone());
                }
            }
        }
        output
    }

    fn learn(&self, label: &str, results: &FieldMap) -> usize {
        if label.is_empty() {
            return 0;
        }

        let learnable: Vec<(String, TemplateRule)> = results
            .iter()
            .filter_map(|(field, value)| {
                TemplateRule::from_value(value).map(|rule| (field.clone(), rule))
            })
            .collect();

        if learnable.is_empty() {
            return 0;
        }

        let mut data = self.lock();
        let label_rules = data.template_cache.entry(label.to_string()).or_default();
        let count = learnable.len();
        for (field, rule) in learnable {
            label_rules.insert(field, rule);
        }

        tracing::info!(label, rules = count, "Learned template rules");
        self.persist_logged(&data, "template_learn");
        count
    }
}

/// Shortened key for log lines.
fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}
