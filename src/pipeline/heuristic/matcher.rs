use serde_json::Value;

use super::anchor::{extract_below, extract_right, find_anchor};
use super::rules::{HeuristicRegistry, HeuristicRule};
use super::zone::{extract_vocabulary, extract_zone, PageSize};
use crate::pipeline::document::PositionedToken;
use crate::pipeline::types::{Schema, StageOutput};

/// Stage 1: deterministic, layout-aware extraction.
///
/// Stateless apart from its rule registry. A field without a rule, or
/// whose rule finds nothing, is handed to the next stage untouched.
#[derive(Debug, Clone, Default)]
pub struct HeuristicMatcher {
    registry: HeuristicRegistry,
    page: PageSize,
}

impl HeuristicMatcher {
    pub fn new(registry: HeuristicRegistry, page: PageSize) -> Self {
        Self { registry, page }
    }

    /// Matcher with the built-in layout rules on an A4 page.
    pub fn builtin() -> Self {
        Self::new(HeuristicRegistry::builtin(), PageSize::default())
    }

    /// Resolve what the rules can; everything else goes to `remaining`.
    pub fn extract(&self, tokens: &[PositionedToken], schema: &Schema) -> StageOutput {
        let mut output = StageOutput::default();

        for (field, description) in schema {
            let value = self
                .registry
                .get(field)
                .and_then(|rule| self.apply_rule(tokens, rule))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            match value {
                Some(v) => {
                    tracing::debug!(field = %field, value = %v, "Heuristic match");
                    output.found.insert(field.clone(), Value::String(v));
                }
                None => {
                    output.remaining.insert(field.clone(), description.clone());
                }
            }
        }

        output
    }

    /// Run one rule. `None` when its anchor, zone, or vocabulary finds nothing.
    pub fn apply_rule(&self, tokens: &[PositionedToken], rule: &HeuristicRule) -> Option<String> {
        match rule {
            HeuristicRule::AnchorBelow { anchor } => {
                let span = find_anchor(tokens, anchor)?;
                extract_below(tokens, &span)
            }
            HeuristicRule::AnchorRight { anchor } => {
                let span = find_anchor(tokens, anchor)?;
                extract_right(tokens, &span)
            }
            HeuristicRule::Zone { region } => extract_zone(tokens, &self.page, region),
            HeuristicRule::Vocabulary { values } => extract_vocabulary(tokens, values),
        }
    }
}
