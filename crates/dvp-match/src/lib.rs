//! DVP-Match: reconciling an applicant's name with the name on a document
//!
//! Names are first reduced to canonical variants (see [`canonicalizer`]),
//! then compared by a fixed list of strategies (see [`matcher`]).
//!
//! # Example
//!
//! ```
//! use dvp_match::{match_names, MatchConfig, VariantKind};
//!
//! let result = match_names("Иванов Иван Иванович", "ИВАНОВ И.И.", &MatchConfig::default());
//! assert!(result.matched);
//! assert_eq!(result.matched_variant, Some(VariantKind::Initials));
//! ```

pub mod canonicalizer;
pub mod matcher;

pub use canonicalizer::{
    canonicalize, canonicalize_as, normalize_text, NameRole, NameVariant, VariantKind, VariantSet,
};
pub use matcher::{
    match_names, match_variants, similarity, MatchConfig, MatchResult, MatchStrategy,
    DEFAULT_FUZZY_THRESHOLD,
};
