//! Data Model: stage records, extracted fields and the terminal artifact
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::ErrorCode;

/// Per-stage wall-clock durations, keyed by stage id
pub type Timings = BTreeMap<String, u64>;

/// Named business checks and whether each one passed
pub type Checks = BTreeMap<String, bool>;

/// One page of recognized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrPage {
    #[serde(alias = "pageNumber")]
    pub page_number: u32,
    pub text: String,
}

/// Output of the document-type classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTypeCheck {
    #[serde(alias = "detectedTypes")]
    pub detected_types: Vec<String>,
    #[serde(alias = "isSingleDocType")]
    pub is_single_doc_type: bool,
    #[serde(alias = "isDocTypeKnown")]
    pub is_doc_type_known: bool,
}

impl DocTypeCheck {
    /// Detected labels with blanks and case/spacing duplicates removed,
    /// in first-seen order
    pub fn distinct_types(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for label in &self.detected_types {
            let key = normalize_type_key(label);
            if !key.is_empty() && !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    /// More than one document was uploaded in a single file
    pub fn has_multiple_documents(&self) -> bool {
        !self.is_single_doc_type || self.distinct_types().len() > 1
    }
}

/// Canonical policy-table key for a document-type label:
/// trimmed, lowercased, `_` and whitespace folded into `-`.
pub fn normalize_type_key(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Fields accumulated by the pipeline. Anything a stage never reached stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub fio: Option<String>,
    pub doc_date: Option<NaiveDate>,
    pub doc_type: Option<String>,
    pub is_single_doc_type: Option<bool>,
    /// End of a decree period, for decree-based document types
    pub decree_end_date: Option<NaiveDate>,
    /// Raw date text that was read off the document but is not a real date
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_dates: Vec<String>,
}

/// A code with its catalog message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: ErrorCode,
    pub message: String,
}

/// The single artifact a run emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalResult {
    pub run_id: Uuid,
    pub verdict: bool,
    pub errors: Vec<ErrorEntry>,
    pub extracted: ExtractedFields,
    pub timings: Timings,
    #[serde(default)]
    pub checks: Checks,
}

impl TerminalResult {
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
