use serde::{Deserialize, Serialize};

use super::rules::{is_known_label, PageRegion};
use crate::config::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::pipeline::document::PositionedToken;

/// Zone lines this short (in characters) or shorter are noise.
pub const MIN_ZONE_TEXT_LEN: usize = 3;

/// Page dimensions used to scale fractional regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
        }
    }
}

impl PageSize {
    /// Whether the token's origin (top-left corner) lies in the region.
    pub fn contains(&self, region: &PageRegion, token: &PositionedToken) -> bool {
        let x_lo = region.x_start * self.width;
        let x_hi = region.x_end * self.width;
        let y_lo = region.y_start * self.height;
        let y_hi = region.y_end * self.height;
        token.x0 >= x_lo && token.x0 < x_hi && token.y0 >= y_lo && token.y0 < y_hi
    }
}

/// Group tokens (already in reading order) into visual lines.
fn group_lines<'a>(tokens: &[&'a PositionedToken]) -> Vec<Vec<&'a PositionedToken>> {
    let mut lines: Vec<Vec<&PositionedToken>> = Vec::new();
    for &token in tokens {
        match lines.last_mut() {
            Some(line) if line[0].shares_line_with(token) => line.push(token),
            _ => lines.push(vec![token]),
        }
    }
    lines
}

/// First line inside `region` that is longer than [`MIN_ZONE_TEXT_LEN`]
/// characters and is not one of the known field labels.
pub fn extract_zone(tokens: &[PositionedToken], page: &PageSize, region: &PageRegion) -> Option<String> {
    let inside: Vec<&PositionedToken> = tokens
        .iter()
        .filter(|t| !t.clean_text().is_empty() && page.contains(region, t))
        .collect();

    group_lines(&inside)
        .into_iter()
        .map(|line| line.iter().map(|t| t.clean_text()).collect::<Vec<_>>().join(" "))
        .find(|text| text.chars().count() > MIN_ZONE_TEXT_LEN && !is_known_label(text))
}

/// First token matching one of `values` case-insensitively, as printed.
pub fn extract_vocabulary(tokens: &[PositionedToken], values: &[String]) -> Option<String> {
    tokens
        .iter()
        .map(|t| t.clean_text())
        .find(|text| {
            let upper = text.to_uppercase();
            values.iter().any(|v| v.to_uppercase() == upper)
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> PositionedToken {
        PositionedToken::new(x0, y0, x1, y1, text)
    }

    #[test]
    fn zone_returns_first_meaningful_line() {
        let tokens = vec![
            tok(20.0, 20.0, 40.0, 30.0, "OAB"),
            tok(50.0, 50.0, 200.0, 70.0, "JOANA D'ARC\n"),
        ];
        let page = PageSize::default();
        assert_eq!(
            extract_zone(&tokens, &page, &PageRegion::TOP_LEFT_QUARTER).as_deref(),
            Some("JOANA D'ARC")
        );
    }

    #[test]
    fn zone_skips_known_labels() {
        let tokens = vec![
            tok(50.0, 30.0, 100.0, 40.0, "Nome"),
            tok(50.0, 50.0, 200.0, 70.0, "JOANA D'ARC"),
        ];
        let page = PageSize::default();
        assert_eq!(
            extract_zone(&tokens, &page, &PageRegion::TOP_LEFT_QUARTER).as_deref(),
            Some("JOANA D'ARC")
        );
    }

    #[test]
    fn zone_joins_tokens_on_one_line() {
        let tokens = vec![
            tok(50.0, 50.0, 100.0, 70.0, "JOANA").at(0, 0, 0),
            tok(105.0, 50.0, 160.0, 70.0, "D'ARC").at(0, 0, 1),
        ];
        let page = PageSize::default();
        assert_eq!(
            extract_zone(&tokens, &page, &PageRegion::TOP_LEFT_QUARTER).as_deref(),
            Some("JOANA D'ARC")
        );
    }

    #[test]
    fn zone_boundary_is_half_open_on_origin() {
        let page = PageSize::default();
        // Origin exactly on the vertical midline belongs to the right half.
        let on_midline = vec![tok(297.5, 100.0, 400.0, 110.0, "MIDLINE")];
        assert!(extract_zone(&on_midline, &page, &PageRegion::TOP_LEFT_QUARTER).is_none());
        assert_eq!(
            extract_zone(&on_midline, &page, &PageRegion::TOP_RIGHT_QUARTER).as_deref(),
            Some("MIDLINE")
        );
        // A token that starts inside but extends past the boundary still counts.
        let straddling = vec![tok(290.0, 100.0, 400.0, 110.0, "STRADDLE")];
        assert!(extract_zone(&straddling, &page, &PageRegion::TOP_LEFT_QUARTER).is_some());
        // Origin exactly on the horizontal midline belongs to the bottom half.
        let on_equator = vec![tok(100.0, 0.5 * PAGE_HEIGHT, 200.0, 431.0, "EQUATOR")];
        assert!(extract_zone(&on_equator, &page, &PageRegion::TOP_LEFT_QUARTER).is_none());
        assert_eq!(
            extract_zone(&on_equator, &page, &PageRegion::BOTTOM_LEFT_QUARTER).as_deref(),
            Some("EQUATOR")
        );
    }

    #[test]
    fn zone_ignores_short_lines() {
        let tokens = vec![tok(480.0, 800.0, 500.0, 820.0, "OK")];
        let page = PageSize::default();
        assert!(extract_zone(&tokens, &page, &PageRegion::BOTTOM_RIGHT_QUARTER).is_none());
    }

    #[test]
    fn zone_scales_with_page_size() {
        let tokens = vec![tok(150.0, 150.0, 190.0, 160.0, "SMALL PAGE")];
        let page = PageSize { width: 200.0, height: 200.0 };
        assert!(extract_zone(&tokens, &page, &PageRegion::BOTTOM_RIGHT_QUARTER).is_some());
        assert!(extract_zone(&tokens, &PageSize::default(), &PageRegion::BOTTOM_RIGHT_QUARTER).is_none());
    }

    #[test]
    fn vocabulary_matches_case_insensitively() {
        let values = vec!["SUPLEMENTAR".to_string(), "ADVOGADO".to_string()];
        let tokens = vec![tok(0.0, 0.0, 10.0, 10.0, "Nome"), tok(0.0, 20.0, 10.0, 30.0, "suplementar\n")];
        assert_eq!(extract_vocabulary(&tokens, &values).as_deref(), Some("suplementar"));
    }

    #[test]
    fn vocabulary_returns_token_as_printed() {
        let values = vec!["ADVOGADA".to_string()];
        let tokens = vec![tok(0.0, 0.0, 10.0, 10.0, " Advogada ")];
        assert_eq!(extract_vocabulary(&tokens, &values).as_deref(), Some("Advogada"));
    }

    #[test]
    fn vocabulary_requires_whole_token() {
        let values = vec!["ADVOGADO".to_string()];
        let tokens = vec![tok(0.0, 0.0, 10.0, 10.0, "ADVOGADOS ASSOCIADOS")];
        assert!(extract_vocabulary(&tokens, &values).is_none());
    }
}
