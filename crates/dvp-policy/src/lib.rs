//! DVP Policy: document validity windows
//!
//! ```text
//! doc_type ──→ PolicyTable ──→ ValidityPolicy { min_age_days ..= max_age_days }
//!                  │                          ↓
//!             (no policy)      age = reference_date - doc_date (never negative)
//!                  ↓                          ↓
//!          DOC_TYPE_UNKNOWN     valid | DOC_DATE_TOO_OLD | DOC_DATE_TOO_RECENT
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use dvp_policy::{parse_document_date, ValidityEngine};
//!
//! let engine = ValidityEngine::with_defaults();
//! let issued = parse_document_date("01.03.2024").unwrap();
//! let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
//!
//! let check = engine.check_validity("reference-letter", Some(issued), today);
//! assert!(check.valid);
//! ```

pub mod dates;
pub mod policy;
pub mod validity;

pub use dates::{parse_document_date, parse_optional_date, DateParseError};
pub use policy::{default_policies, PolicyError, PolicyTable, ValidityPolicy};
pub use validity::{age_in_days, ValidityCheck, ValidityEngine};
