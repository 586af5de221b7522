//! Validity checks for document dates
//!
//! Looks the document type up in the policy table and tests the document's
//! age against the policy window.

use chrono::NaiveDate;
use dvp_core::ErrorCode;
use serde::{Deserialize, Serialize};

use crate::policy::{PolicyTable, ValidityPolicy};

/// Result of one validity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Age the decision was based on, when a date was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<u32>,
}

impl ValidityCheck {
    fn valid(age_days: u32) -> Self {
        Self {
            valid: true,
            code: None,
            age_days: Some(age_days),
        }
    }

    fn invalid(code: ErrorCode, age_days: Option<u32>) -> Self {
        Self {
            valid: false,
            code: Some(code),
            age_days,
        }
    }
}

/// Age of a document in whole days. A date in the future counts as zero.
pub fn age_in_days(doc_date: NaiveDate, reference_date: NaiveDate) -> u32 {
    let days = reference_date.signed_duration_since(doc_date).num_days();
    days.clamp(0, u32::MAX as i64) as u32
}

#[derive(Debug, Clone, Default)]
pub struct ValidityEngine {
    table: PolicyTable,
}

impl ValidityEngine {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }

    pub fn with_defaults() -> Self {
        Self::new(PolicyTable::with_defaults())
    }

    pub fn policy(&self, doc_type: &str) -> Option<&ValidityPolicy> {
        self.table.get(doc_type)
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Check one document date against its type's window.
    ///
    /// Unknown types short-circuit with `DOC_TYPE_UNKNOWN` before the date is
    /// looked at. Both bounds are inclusive; a document younger than the
    /// window gets `DOC_DATE_TOO_RECENT`, an older one `DOC_DATE_TOO_OLD`.
    pub fn check_validity(
        &self,
        doc_type: &str,
        doc_date: Option<NaiveDate>,
        reference_date: NaiveDate,
    ) -> ValidityCheck {
        let policy = match self.table.get(doc_type) {
            Some(policy) => policy,
            None => return ValidityCheck::invalid(ErrorCode::DocTypeUnknown, None),
        };

        let doc_date = match doc_date {
            Some(date) => date,
            None => return ValidityCheck::invalid(ErrorCode::DocDateMissing, None),
        };

        let age = age_in_days(doc_date, reference_date);
        if age > policy.max_age_days {
            ValidityCheck::invalid(ErrorCode::DocDateTooOld, Some(age))
        } else if age < policy.min_age_days {
            ValidityCheck::invalid(ErrorCode::DocDateTooRecent, Some(age))
        } else {
            ValidityCheck::valid(age)
        }
    }
}
