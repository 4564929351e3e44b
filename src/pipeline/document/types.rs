use serde::{Deserialize, Serialize};

use super::DocumentError;

/// A single word on the page with its bounding box in page points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub text: String,
    #[serde(default)]
    pub block: u32,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub word: u32,
}

impl PositionedToken {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            text: text.to_string(),
            block: 0,
            line: 0,
            word: 0,
        }
    }

    /// Same token with reading-order indices attached.
    pub fn at(mut self, block: u32, line: u32, word: u32) -> Self {
        self.block = block;
        self.line = line;
        self.word = word;
        self
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Token text without surrounding whitespace (readers often keep a trailing newline).
    pub fn clean_text(&self) -> &str {
        self.text.trim()
    }

    /// True when `other` sits on this token's visual line: its vertical
    /// centre falls inside this token's `[y0, y1]`.
    pub fn shares_line_with(&self, other: &PositionedToken) -> bool {
        let cy = other.center_y();
        cy >= self.y0 && cy <= self.y1
    }
}

/// Sort tokens into reading order using the reader-supplied indices.
pub fn sort_reading_order(tokens: &mut [PositionedToken]) {
    tokens.sort_by_key(|t| (t.block, t.line, t.word));
}

/// Everything the resolution pipeline needs from a source document.
///
/// Tokens must come back in natural reading order (top-to-bottom,
/// left-to-right); the heuristic matcher's first-match logic relies on it.
pub trait DocumentHandle {
    /// Fixed-length hex digest of the raw document bytes.
    fn content_hash(&self) -> Result<String, DocumentError>;

    /// Plain text of the (single) page.
    fn text(&self) -> Result<String, DocumentError>;

    /// Positioned tokens of the page.
    fn tokens(&self) -> Result<Vec<PositionedToken>, DocumentError>;
}

/// In-memory document, for callers that already hold text and layout.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    content_hash: String,
    text: String,
    tokens: Vec<PositionedToken>,
}

impl MemoryDocument {
    /// Builds a document whose hash is derived from its text.
    pub fn new(text: &str, tokens: Vec<PositionedToken>) -> Self {
        Self {
            content_hash: super::hash::content_hash(text.as_bytes()),
            text: text.to_string(),
            tokens,
        }
    }

    pub fn with_hash(mut self, content_hash: &str) -> Self {
        self.content_hash = content_hash.to_string();
        self
    }
}

impl DocumentHandle for MemoryDocument {
    fn content_hash(&self) -> Result<String, DocumentError> {
        Ok(self.content_hash.clone())
    }

    fn text(&self) -> Result<String, DocumentError> {
        Ok(self.text.clone())
    }

    fn tokens(&self) -> Result<Vec<PositionedToken>, DocumentError> {
        Ok(self.tokens.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_reader_newlines() {
        let token = PositionedToken::new(0.0, 0.0, 10.0, 10.0, "Inscrição\n");
        assert_eq!(token.clean_text(), "Inscrição");
    }

    #[test]
    fn line_membership_uses_vertical_centre() {
        let anchor = PositionedToken::new(50.0, 80.0, 100.0, 90.0, "Inscrição");
        let same_line = PositionedToken::new(110.0, 80.0, 160.0, 90.0, "Seccional");
        let next_line = PositionedToken::new(50.0, 90.0, 100.0, 100.0, "101943");
        assert!(anchor.shares_line_with(&same_line));
        assert!(!anchor.shares_line_with(&next_line));
    }

    #[test]
    fn reading_order_sort_uses_indices() {
        let mut tokens = vec![
            PositionedToken::new(0.0, 20.0, 5.0, 25.0, "b").at(1, 0, 0),
            PositionedToken::new(10.0, 0.0, 15.0, 5.0, "a2").at(0, 0, 1),
            PositionedToken::new(0.0, 0.0, 5.0, 5.0, "a1").at(0, 0, 0),
        ];
        sort_reading_order(&mut tokens);
        let texts: Vec<&str> = tokens.iter().map(|t| t.clean_text()).collect();
        assert_eq!(texts, vec!["a1", "a2", "b"]);
    }

    #[test]
    fn token_deserializes_without_indices() {
        let json = r#"{"x0": 1.0, "y0": 2.0, "x1": 3.0, "y1": 4.0, "text": "CPF"}"#;
        let token: PositionedToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.text, "CPF");
        assert_eq!(token.block, 0);
    }

    #[test]
    fn memory_document_hash_is_stable() {
        let a = MemoryDocument::new("same text", vec![]);
        let b = MemoryDocument::new("same text", vec![]);
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
        let c = MemoryDocument::new("same text", vec![]).with_hash("abc");
        assert_eq!(c.content_hash().unwrap(), "abc");
    }
}
