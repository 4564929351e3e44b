use crate::pipeline::types::{FieldMap, ResolutionResult, Schema, StageOutput};

/// Stage 0: complete results keyed by document content and field set.
pub trait HashCache: Send + Sync {
    /// A previously stored complete result, returned as-is.
    fn lookup(&self, key: &str) -> Option<ResolutionResult>;

    /// Record a complete result. An existing entry for `key` is left untouched.
    /// Persistence failures are logged, never returned.
    fn store(&self, key: &str, result: &ResolutionResult);
}

/// Stage 2: per-label rules learned from generative answers.
pub trait TemplateCache: Send + Sync {
    /// Validate stored rules for `label` against the current document text.
    fn lookup_rules(&self, label: &str, text: &str, schema: &Schema) -> StageOutput;

    /// Learn rules from freshly resolved values. Returns how many were stored.
    fn learn(&self, label: &str, results: &FieldMap) -> usize;
}
