//! Context reduction before the generative stage.
//!
//! Keeps only the lines likely to hold the remaining fields so the
//! generative call sees a smaller prompt. Pure functions, no state.

use std::collections::BTreeSet;

use super::heuristic::KNOWN_LABELS;
use super::types::Schema;

/// Lines kept before a matching line.
const LINES_BEFORE: usize = 1;
/// Lines kept after a matching line.
const LINES_AFTER: usize = 2;

/// Fixed head/tail window for labels with a stereotyped layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWindow {
    pub head: usize,
    pub tail: usize,
}

/// Labels that skip clue matching in favour of a fixed window.
const FIXED_WINDOWS: &[(&str, FixedWindow)] = &[("tela_sistema", FixedWindow { head: 30, tail: 10 })];

pub fn fixed_window_for(label: &str) -> Option<FixedWindow> {
    FIXED_WINDOWS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, window)| *window)
}

/// Shrink `text` to the lines relevant to `schema`.
///
/// Falls back to the unchanged text when no line matches a clue.
pub fn reduce(label: &str, text: &str, schema: &Schema) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    if let Some(window) = fixed_window_for(label) {
        return apply_fixed_window(&lines, window);
    }

    let clues = build_clues(schema);
    let mut keep = BTreeSet::new();
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if clues.iter().any(|clue| lower.contains(clue.as_str())) {
            let start = i.saturating_sub(LINES_BEFORE);
            let end = (i + LINES_AFTER).min(lines.len() - 1);
            keep.extend(start..=end);
        }
    }

    if keep.is_empty() {
        tracing::debug!(label = %label, "No clue matched, passing full text");
        return text.to_string();
    }

    let reduced = keep.iter().map(|&i| lines[i]).collect::<Vec<_>>().join("\n");
    tracing::debug!(
        label = %label,
        kept_lines = keep.len(),
        total_lines = lines.len(),
        "Context reduced"
    );
    reduced
}

fn build_clues(schema: &Schema) -> Vec<String> {
    let mut clues: Vec<String> = KNOWN_LABELS.iter().map(|l| l.to_lowercase()).collect();
    clues.extend(schema.keys().map(|field| field.replace('_', " ").to_lowercase()));
    clues.retain(|c| !c.trim().is_empty());
    clues
}

fn apply_fixed_window(lines: &[&str], window: FixedWindow) -> String {
    if lines.len() <= window.head + window.tail {
        return lines.join("\n");
    }
    let mut kept: Vec<&str> = lines[..window.head].to_vec();
    kept.extend_from_slice(&lines[lines.len() - window.tail..]);
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: &[&str]) -> Schema {
        fields.iter().map(|f| (f.to_string(), String::new())).collect()
    }

    #[test]
    fn keeps_clue_neighbourhood() {
        let text = "intro\nfiller a\nheader\nValor da parcela: 100\nx\ny\nz\nfooter";
        let reduced = reduce("extrato", text, &schema(&["valor_da_parcela"]));
        assert_eq!(reduced, "header\nValor da parcela: 100\nx\ny");
    }

    #[test]
    fn known_labels_are_clues() {
        let text = "a\nb\nc\nCidade: Goiânia\nd\ne\nf\ng";
        let reduced = reduce("extrato", text, &schema(&["unrelated"]));
        assert_eq!(reduced, "c\nCidade: Goiânia\nd\ne");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let text = "ENDERECO PROFISSIONAL\nRua A, 10";
        let reduced = reduce("carteira_oab", text, &schema(&["endereco_profissional"]));
        assert_eq!(reduced, "ENDERECO PROFISSIONAL\nRua A, 10");
    }

    #[test]
    fn blank_lines_are_dropped_and_windows_merge() {
        let text = "Tipo: CPF\n\n   \nProduto: X\nlast\nafter";
        let reduced = reduce("extrato", text, &Schema::new());
        assert_eq!(reduced, "Tipo: CPF\nProduto: X\nlast\nafter");
    }

    #[test]
    fn no_clue_returns_original_text() {
        let text = "nothing\n\nrelevant here";
        assert_eq!(reduce("extrato", text, &schema(&["valor"])), text);
    }

    #[test]
    fn fixed_window_for_system_screen() {
        let text: String = (0..100).map(|i| format!("linha {i}\n")).collect();
        let reduced = reduce("tela_sistema", &text, &schema(&["cidade"]));
        let lines: Vec<&str> = reduced.lines().collect();
        assert_eq!(lines.len(), 40);
        assert_eq!(lines[0], "linha 0");
        assert_eq!(lines[29], "linha 29");
        assert_eq!(lines[30], "linha 90");
        assert_eq!(lines[39], "linha 99");
    }

    #[test]
    fn fixed_window_keeps_short_documents_whole() {
        let text = "a\n\nb\nc";
        assert_eq!(reduce("tela_sistema", text, &Schema::new()), "a\nb\nc");
    }

    #[test]
    fn window_lookup() {
        assert_eq!(fixed_window_for("tela_sistema"), Some(FixedWindow { head: 30, tail: 10 }));
        assert!(fixed_window_for("carteira_oab").is_none());
    }
}
