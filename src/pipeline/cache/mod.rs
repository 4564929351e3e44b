//! Stage 0 (hash cache) and Stage 2 (template cache).
//!
//! Both caches live in one JSON store that is loaded once and rewritten in
//! full after every mutation. The orchestrator only sees the two narrow
//! traits in [`traits`]; [`store::CacheStore`] implements both.

pub mod traits;
pub mod rules;
pub mod store;

pub use traits::*;
pub use rules::TemplateRule;
pub use store::{CacheData, CacheStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
