use sha2::{Digest, Sha256};

use crate::pipeline::types::Schema;

/// Length of the schema fingerprint appended to hash-cache keys.
const SCHEMA_FINGERPRINT_LEN: usize = 16;

/// Lowercase hex SHA-256 of raw document bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Canonical fingerprint of a schema's field-name set.
///
/// Descriptions are excluded: they don't change which keys the result has.
pub fn schema_fingerprint(schema: &Schema) -> String {
    let joined = schema.keys().map(String::as_str).collect::<Vec<_>>().join("\n");
    let mut digest = content_hash(joined.as_bytes());
    digest.truncate(SCHEMA_FINGERPRINT_LEN);
    digest
}

/// Hash-cache key: document content plus the requested field set.
pub fn cache_key(content_hash: &str, schema: &Schema) -> String {
    format!("{content_hash}:{}", schema_fingerprint(schema))
}
