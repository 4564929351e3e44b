//! Rule definitions and the field → rule registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label strings that appear on supported layouts. Zone matches equal to
/// one of these are skipped, and the context reducer uses them as clues.
pub const KNOWN_LABELS: &[&str] = &[
    "Nome",
    "Inscrição",
    "Seccional",
    "Subseção",
    "Categoria",
    "Situação",
    "Endereço Profissional",
    "Telefone Profissional",
    "Pesquisar por:",
    "Tipo:",
    "Cidade:",
    "Data Base:",
    "Produto:",
    "Sistema:",
    "Valor",
    "Parcelas",
    "Total",
];

/// Category values printed on bar registration cards.
pub const REGISTRATION_CATEGORIES: &[&str] = &[
    "ADVOGADO",
    "ADVOGADA",
    "SUPLEMENTAR",
    "ESTAGIARIO",
    "ESTAGIARIA",
    "ESTAGIÁRIO",
    "ESTAGIÁRIA",
];

/// Fractional page region. Both axes are half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRegion {
    pub x_start: f32,
    pub x_end: f32,
    pub y_start: f32,
    pub y_end: f32,
}

impl PageRegion {
    pub const TOP_LEFT_QUARTER: Self = Self { x_start: 0.0, x_end: 0.5, y_start: 0.0, y_end: 0.5 };
    pub const TOP_RIGHT_QUARTER: Self = Self { x_start: 0.5, x_end: 1.0, y_start: 0.0, y_end: 0.5 };
    pub const BOTTOM_LEFT_QUARTER: Self = Self { x_start: 0.0, x_end: 0.5, y_start: 0.5, y_end: 1.0 };
    pub const BOTTOM_RIGHT_QUARTER: Self = Self { x_start: 0.5, x_end: 1.0, y_start: 0.5, y_end: 1.0 };
}

/// One deterministic extraction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeuristicRule {
    /// Value printed under the anchor, in the anchor's column.
    AnchorBelow { anchor: String },
    /// Value printed after the anchor on the same line.
    AnchorRight { anchor: String },
    /// First non-trivial line inside a page region.
    Zone { region: PageRegion },
    /// First token equal to one of a small set of category values.
    Vocabulary { values: Vec<String> },
}

impl HeuristicRule {
    pub fn below(anchor: &str) -> Self {
        Self::AnchorBelow { anchor: anchor.to_string() }
    }

    pub fn right(anchor: &str) -> Self {
        Self::AnchorRight { anchor: anchor.to_string() }
    }

    pub fn zone(region: PageRegion) -> Self {
        Self::Zone { region }
    }

    pub fn vocabulary(values: &[&str]) -> Self {
        Self::Vocabulary {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AnchorBelow { .. } => "anchor_below",
            Self::AnchorRight { .. } => "anchor_right",
            Self::Zone { .. } => "zone",
            Self::Vocabulary { .. } => "vocabulary",
        }
    }
}

/// Field name → rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRegistry {
    rules: BTreeMap<String, HeuristicRule>,
}

impl HeuristicRegistry {
    /// Registry with no rules: every field passes through.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rules for the bar registration card and the system search screen.
    pub fn builtin() -> Self {
        Self::empty()
            // Registration card
            .with_rule("inscricao", HeuristicRule::below("Inscrição"))
            .with_rule("seccional", HeuristicRule::below("Seccional"))
            .with_rule("subsecao", HeuristicRule::below("Subseção"))
            .with_rule("categoria", HeuristicRule::vocabulary(REGISTRATION_CATEGORIES))
            .with_rule("nome", HeuristicRule::zone(PageRegion::TOP_LEFT_QUARTER))
            .with_rule("situacao", HeuristicRule::zone(PageRegion::BOTTOM_RIGHT_QUARTER))
            // System search screen
            .with_rule("pesquisa_por", HeuristicRule::right("Pesquisar por:"))
            .with_rule("tipo", HeuristicRule::right("Tipo:"))
            .with_rule("cidade", HeuristicRule::right("Cidade:"))
            .with_rule("data_base", HeuristicRule::right("Data Base:"))
            .with_rule("produto", HeuristicRule::right("Produto:"))
    }

    pub fn with_rule(mut self, field: &str, rule: HeuristicRule) -> Self {
        self.register(field, rule);
        self
    }

    /// Register or replace the rule for `field`.
    pub fn register(&mut self, field: &str, rule: HeuristicRule) {
        self.rules.insert(field.to_string(), rule);
    }

    pub fn get(&self, field: &str) -> Option<&HeuristicRule> {
        self.rules.get(field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Case-insensitive comparison against the known label list, ignoring a trailing colon.
pub fn is_known_label(text: &str) -> bool {
    let normalized = normalize_label(text);
    KNOWN_LABELS.iter().any(|label| normalize_label(label) == normalized)
}

fn normalize_label(text: &str) -> String {
    text.trim().trim_end_matches(':').trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_both_layouts() {
        let registry = HeuristicRegistry::builtin();
        assert_eq!(registry.get("inscricao"), Some(&HeuristicRule::below("Inscrição")));
        assert_eq!(registry.get("cidade"), Some(&HeuristicRule::right("Cidade:")));
        assert_eq!(registry.get("nome").map(|r| r.kind()), Some("zone"));
        assert_eq!(registry.get("categoria").map(|r| r.kind()), Some("vocabulary"));
        assert!(registry.get("endereco_profissional").is_none());
    }

    #[test]
    fn register_replaces_rule() {
        let mut registry = HeuristicRegistry::builtin();
        let before = registry.len();
        registry.register("cidade", HeuristicRule::below("Cidade"));
        assert_eq!(registry.len(), before);
        assert_eq!(registry.get("cidade"), Some(&HeuristicRule::below("Cidade")));
    }

    #[test]
    fn known_label_ignores_case_and_colon() {
        assert!(is_known_label("INSCRIÇÃO"));
        assert!(is_known_label("cidade"));
        assert!(is_known_label(" Data Base: "));
        assert!(!is_known_label("JOANA D'ARC"));
    }

    #[test]
    fn rules_serialize_tagged() {
        let json = serde_json::to_string(&HeuristicRule::right("Tipo:")).unwrap();
        assert_eq!(json, r#"{"kind":"anchor_right","anchor":"Tipo:"}"#);
        let parsed: HeuristicRule =
            serde_json::from_str(r#"{"kind":"vocabulary","values":["A","B"]}"#).unwrap();
        assert_eq!(parsed, HeuristicRule::vocabulary(&["A", "B"]));
    }
}
