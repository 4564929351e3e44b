//! Field resolution pipeline.
//!
//! - [`document`]: document handle contract, file reader, hashing
//! - [`cache`]: hash cache (stage 0) and template cache (stage 2)
//! - [`heuristic`]: layout rules (stage 1)
//! - [`reducer`]: context shrinking before stage 3
//! - [`generative`]: LLM fallback (stage 3)
//! - [`orchestrator`]: runs the stages for one document
//! - [`batch`]: dataset-driven runs

pub mod types;
pub mod document;
pub mod cache;
pub mod heuristic;
pub mod reducer;
pub mod generative;
pub mod orchestrator;
pub mod batch;

pub use types::*;
pub use orchestrator::Orchestrator;
