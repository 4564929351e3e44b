use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Docfields";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cache store file, relative to the working directory unless overridden.
pub const DEFAULT_CACHE_FILE: &str = "cache_db.json";

/// Directory holding the dataset and the source documents it references.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Dataset file name inside the data directory.
pub const DEFAULT_DATASET_FILE: &str = "dataset.json";

/// Page geometry (A4 in PDF points). Zones are fractions of these.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "docfields=info,warn"
}

pub fn default_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

pub fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR).join(DEFAULT_DATASET_FILE)
}
