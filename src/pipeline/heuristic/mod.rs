//! Stage 1: rule-based extraction from positioned tokens.
//!
//! Rules are looked up per field in a [`HeuristicRegistry`]. Four rule
//! kinds exist: value below an anchor, value right of an anchor, first
//! line in a page zone, and membership in a fixed vocabulary.

pub mod anchor;
pub mod matcher;
pub mod rules;
pub mod zone;

pub use anchor::{find_anchor, AnchorSpan, COLUMN_TOLERANCE};
pub use matcher::HeuristicMatcher;
pub use rules::{is_known_label, HeuristicRegistry, HeuristicRule, PageRegion, KNOWN_LABELS};
pub use zone::{PageSize, MIN_ZONE_TEXT_LEN};
