//! File-backed document handle.
//!
//! Text comes from the first page of a PDF (via pdf-extract) or from the
//! raw UTF-8 bytes of any other file. Positioned tokens are read from a
//! `<file>.tokens.json` sidecar written by the layout reader; without a
//! sidecar the document simply has no tokens and the heuristic stage
//! resolves nothing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::hash::content_hash;
use super::types::{sort_reading_order, DocumentHandle, PositionedToken};
use super::DocumentError;

const TOKEN_SIDECAR_SUFFIX: &str = ".tokens.json";

/// A document read from disk. Bytes are loaded once at open time.
pub struct FileDocument {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl FileDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_pdf(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
            || self.bytes.starts_with(b"%PDF")
    }
}

/// Location of the token sidecar for a document path.
pub fn token_sidecar_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(TOKEN_SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Extract the first page of a PDF as plain text.
fn first_pdf_page_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| DocumentError::PdfParsing(e.to_string()))?;
    pages.into_iter().next().ok_or(DocumentError::EmptyPdf)
}

/// Load positioned tokens from a sidecar file, sorted into reading order.
pub fn load_token_sidecar(path: &Path) -> Result<Vec<PositionedToken>, DocumentError> {
    let raw = std::fs::read_to_string(path)?;
    let mut tokens: Vec<PositionedToken> =
        serde_json::from_str(&raw).map_err(|e| DocumentError::TokenLayout(e.to_string()))?;
    sort_reading_order(&mut tokens);
    Ok(tokens)
}

impl DocumentHandle for FileDocument {
    fn content_hash(&self) -> Result<String, DocumentError> {
        Ok(content_hash(&self.bytes))
    }

    fn text(&self) -> Result<String, DocumentError> {
        if self.is_pdf() {
            first_pdf_page_text(&self.bytes)
        } else {
            String::from_utf8(self.bytes.clone())
                .map_err(|e| DocumentError::Encoding(e.to_string()))
        }
    }

    fn tokens(&self) -> Result<Vec<PositionedToken>, DocumentError> {
        let sidecar = token_sidecar_path(&self.path);
        if !sidecar.exists() {
            tracing::debug!(path = %self.path.display(), "No token sidecar, layout stage will see no tokens");
            return Ok(Vec::new());
        }
        load_token_sidecar(&sidecar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileDocument::open(&dir.path().join("missing.pdf"));
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }

    #[test]
    fn plain_text_file_reads_as_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.txt");
        std::fs::write(&path, "Cidade: Mozarlândia\nTipo: CPF").unwrap();

        let doc = FileDocument::open(&path).unwrap();
        assert_eq!(doc.text().unwrap(), "Cidade: Mozarlândia\nTipo: CPF");
        assert_eq!(doc.content_hash().unwrap().len(), 64);
        assert!(doc.tokens().unwrap().is_empty());
    }

    #[test]
    fn invalid_pdf_text_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let doc = FileDocument::open(&path).unwrap();
        assert!(doc.content_hash().is_ok());
        assert!(doc.text().is_err());
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

        let doc = FileDocument::open(&path).unwrap();
        assert!(matches!(doc.text(), Err(DocumentError::Encoding(_))));
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        let sidecar = token_sidecar_path(Path::new("data/oab_1.pdf"));
        assert_eq!(sidecar, PathBuf::from("data/oab_1.pdf.tokens.json"));
    }

    #[test]
    fn sidecar_tokens_loaded_in_reading_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.txt");
        std::fs::write(&path, "JOANA D'ARC").unwrap();
        std::fs::write(
            token_sidecar_path(&path),
            r#"[
                {"x0": 50, "y0": 90, "x1": 100, "y1": 100, "text": "101943", "block": 1, "line": 0, "word": 0},
                {"x0": 50, "y0": 80, "x1": 100, "y1": 90, "text": "Inscrição", "block": 0, "line": 0, "word": 0}
            ]"#,
        )
        .unwrap();

        let doc = FileDocument::open(&path).unwrap();
        let tokens = doc.tokens().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].clean_text(), "Inscrição");
    }

    #[test]
    fn malformed_sidecar_is_layout_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.txt");
        std::fs::write(&path, "text").unwrap();
        std::fs::write(token_sidecar_path(&path), "{not json").unwrap();

        let doc = FileDocument::open(&path).unwrap();
        assert!(matches!(doc.tokens(), Err(DocumentError::TokenLayout(_))));
    }
}
