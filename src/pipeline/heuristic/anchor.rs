//! Anchor search and anchor-relative value extraction.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::document::PositionedToken;

/// Horizontal slack added to each side of the anchor's column (points).
pub const COLUMN_TOLERANCE: f32 = 5.0;

static NUMERIC_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9][0-9.,/\-]*$").expect("valid numeric pattern"));

static SHORT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}]{1,4}$").expect("valid short-code pattern"));

/// Located anchor: token index range and the union of their boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorSpan {
    pub first: usize,
    pub last: usize,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl AnchorSpan {
    fn from_tokens(tokens: &[PositionedToken], first: usize, last: usize) -> Self {
        let span = &tokens[first..=last];
        Self {
            first,
            last,
            x0: span.iter().map(|t| t.x0).fold(f32::INFINITY, f32::min),
            y0: span.iter().map(|t| t.y0).fold(f32::INFINITY, f32::min),
            x1: span.iter().map(|t| t.x1).fold(f32::NEG_INFINITY, f32::max),
            y1: span.iter().map(|t| t.y1).fold(f32::NEG_INFINITY, f32::max),
        }
    }

    fn contains_index(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    /// Vertical centre of `token` lies within the anchor's line band.
    fn on_line(&self, token: &PositionedToken) -> bool {
        let cy = token.center_y();
        cy >= self.y0 && cy <= self.y1
    }
}

/// Find the first occurrence of `anchor` in token order.
///
/// The first anchor word must prefix-match a token and every following
/// word must prefix-match the next tokens. When that fails but the
/// following words all occur inside the first token, the anchor was
/// rendered as one token and that token alone is the match.
pub fn find_anchor(tokens: &[PositionedToken], anchor: &str) -> Option<AnchorSpan> {
    let words: Vec<String> = anchor.split_whitespace().map(str::to_lowercase).collect();
    let (head, rest) = words.split_first()?;

    for (i, token) in tokens.iter().enumerate() {
        let text = token.clean_text().to_lowercase();
        if !text.starts_with(head.as_str()) {
            continue;
        }
        if rest.is_empty() {
            return Some(AnchorSpan::from_tokens(tokens, i, i));
        }

        let followed = rest.iter().enumerate().all(|(k, word)| {
            tokens
                .get(i + 1 + k)
                .map(|next| next.clean_text().to_lowercase().starts_with(word.as_str()))
                .unwrap_or(false)
        });
        if followed {
            return Some(AnchorSpan::from_tokens(tokens, i, i + rest.len()));
        }

        if rest.iter().all(|word| text.contains(word.as_str())) {
            return Some(AnchorSpan::from_tokens(tokens, i, i));
        }
    }

    None
}

/// Whether a column result can be trusted as a whole value.
///
/// Only numbers and short codes fit inside a column reliably. Anything
/// else may continue past the column edge, so the caller reads the line.
pub fn passes_sanity_check(value: &str) -> bool {
    let value = value.trim();
    NUMERIC_ONLY.is_match(value) || SHORT_CODE.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnMode {
    /// Token centre inside the widened column.
    Centre,
    /// Any horizontal overlap with the widened column.
    Overlap,
}

struct Column {
    lo: f32,
    hi: f32,
}

impl Column {
    fn around(span: &AnchorSpan) -> Self {
        Self {
            lo: span.x0 - COLUMN_TOLERANCE,
            hi: span.x1 + COLUMN_TOLERANCE,
        }
    }

    fn holds(&self, token: &PositionedToken, mode: ColumnMode) -> bool {
        match mode {
            ColumnMode::Centre => {
                let cx = token.center_x();
                cx >= self.lo && cx <= self.hi
            }
            ColumnMode::Overlap => token.x1 >= self.lo && token.x0 <= self.hi,
        }
    }
}

/// Nearest token strictly below the anchor (vertical centre past its
/// bottom edge) inside the column. Ties keep token order.
fn nearest_below<'a>(
    tokens: &'a [PositionedToken],
    span: &AnchorSpan,
    column: &Column,
    mode: ColumnMode,
) -> Option<&'a PositionedToken> {
    tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| !span.contains_index(*i))
        .filter(|(_, t)| t.center_y() > span.y1 && column.holds(t, mode))
        .map(|(_, t)| t)
        .min_by(|a, b| a.y0.partial_cmp(&b.y0).unwrap_or(Ordering::Equal))
}

fn join_by_x<'a, I>(tokens: I) -> String
where
    I: Iterator<Item = &'a PositionedToken>,
{
    let mut line: Vec<&PositionedToken> = tokens.filter(|t| !t.clean_text().is_empty()).collect();
    line.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal));
    line.iter().map(|t| t.clean_text()).collect::<Vec<_>>().join(" ")
}

/// Value below the anchor. Ordered fallbacks:
/// 1. nearest token below with its centre in the column, plus its line-mates in the column;
/// 2. if nothing is there, the same search accepting any column overlap;
/// 3. if the column text fails the sanity check, that whole line from the anchor's left edge.
pub fn extract_below(tokens: &[PositionedToken], span: &AnchorSpan) -> Option<String> {
    let column = Column::around(span);

    let (nearest, mode) = nearest_below(tokens, span, &column, ColumnMode::Centre)
        .map(|t| (t, ColumnMode::Centre))
        .or_else(|| {
            nearest_below(tokens, span, &column, ColumnMode::Overlap).map(|t| (t, ColumnMode::Overlap))
        })?;

    let in_column = join_by_x(
        tokens
            .iter()
            .filter(|t| nearest.shares_line_with(t) && column.holds(t, mode)),
    );
    if passes_sanity_check(&in_column) {
        return Some(in_column);
    }

    let whole_line = join_by_x(
        tokens
            .iter()
            .filter(|t| nearest.shares_line_with(t) && t.x0 >= span.x0),
    );
    if whole_line.is_empty() {
        None
    } else {
        Some(whole_line)
    }
}

/// Value right of the anchor on the same line, stopping before the next
/// label (a token containing a colon) once something has been collected.
/// Tokens must start past the anchor's right edge.
pub fn extract_right(tokens: &[PositionedToken], span: &AnchorSpan) -> Option<String> {
    let mut candidates: Vec<&PositionedToken> = tokens
        .iter()
        .enumerate()
        .filter(|(i, t)| !span.contains_index(*i) && span.on_line(t) && t.x0 > span.x1)
        .map(|(_, t)| t)
        .collect();
    candidates.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal));

    let mut parts: Vec<&str> = Vec::new();
    for token in candidates {
        let text = token.clean_text();
        if text.is_empty() {
            continue;
        }
        if !parts.is_empty() && text.contains(':') {
            break;
        }
        parts.push(text);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
