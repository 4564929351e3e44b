pub mod types;
pub mod hash;
pub mod file;

pub use types::*;
pub use hash::*;
pub use file::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF has no pages")]
    EmptyPdf,

    #[error("Text encoding error: {0}")]
    Encoding(String),

    #[error("Token layout file is malformed: {0}")]
    TokenLayout(String),
}
