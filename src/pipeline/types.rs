//! Core types shared by every resolution stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requested fields: name → human-readable description.
pub type Schema = BTreeMap<String, String>;

/// A resolved value. `Value::Null` means unresolved.
pub type FieldValue = Value;

/// Field → value for a subset (or all) of a schema.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Complete answer for a schema: every requested key present, possibly null.
pub type ResolutionResult = FieldMap;

// ═══════════════════════════════════════════
// Stage output
// ═══════════════════════════════════════════

/// What a single stage produced: values it resolved and the schema it
/// hands to the next stage. The two key sets partition the stage's input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    pub found: FieldMap,
    pub remaining: Schema,
}

impl StageOutput {
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }
}

// ═══════════════════════════════════════════
// Pipeline states
// ═══════════════════════════════════════════

/// Pipeline states in strict order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    HashLookup,
    TextExtracted,
    Heuristic,
    Template,
    Generative,
    Finalize,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::HashLookup => "hash_lookup",
            Self::TextExtracted => "text_extracted",
            Self::Heuristic => "heuristic",
            Self::Template => "template",
            Self::Generative => "generative",
            Self::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which stage supplied a field's final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    HashCache,
    Heuristic,
    Template,
    Generative,
    Unresolved,
}

// ═══════════════════════════════════════════
// Resolution (orchestrator output)
// ═══════════════════════════════════════════

/// Result of one orchestrator run.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub values: ResolutionResult,
    pub sources: BTreeMap<String, FieldSource>,
    /// States actually entered, in order.
    pub stages: Vec<PipelineStage>,
    /// Hash-cache key, absent when the document could not be read.
    pub cache_key: Option<String>,
}

impl Resolution {
    pub fn visited(&self, stage: PipelineStage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn resolved_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_null()).count()
    }
}

/// True for values worth keeping: not null, not an empty string or sequence.
pub fn is_meaningful(value: &FieldValue) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
