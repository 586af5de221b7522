//! Unified Error Model
//!
//! Two disjoint families live here. [`ErrorCode`] is a classified outcome that
//! always ends up inside a `TerminalResult`. [`PipelineFault`] is reserved for
//! conditions nobody anticipated and is the only thing that escapes the
//! executor as an `Err`.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every classified condition a run can terminate with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Business validation ===
    FioMismatch,
    FioMissing,
    DocTypeUnknown,
    DocDateTooOld,
    DocDateTooRecent,
    DocDateMissing,
    DocDateInvalid,
    MultipleDocuments,
    FileEmpty,
    FileTooLarge,
    FileTypeUnsupported,

    // === Pipeline faults ===
    OcrFailed,
    DocTypeCheckFailed,
    ExtractFailed,
    LlmResponseInvalid,
    Cancelled,
}

/// Which family a code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// The document was legitimately rejected
    Business,
    /// An upstream adapter or format problem stopped the run
    Fault,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 16] = [
        ErrorCode::FioMismatch,
        ErrorCode::FioMissing,
        ErrorCode::DocTypeUnknown,
        ErrorCode::DocDateTooOld,
        ErrorCode::DocDateTooRecent,
        ErrorCode::DocDateMissing,
        ErrorCode::DocDateInvalid,
        ErrorCode::MultipleDocuments,
        ErrorCode::FileEmpty,
        ErrorCode::FileTooLarge,
        ErrorCode::FileTypeUnsupported,
        ErrorCode::OcrFailed,
        ErrorCode::DocTypeCheckFailed,
        ErrorCode::ExtractFailed,
        ErrorCode::LlmResponseInvalid,
        ErrorCode::Cancelled,
    ];

    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorCode::OcrFailed
            | ErrorCode::DocTypeCheckFailed
            | ErrorCode::ExtractFailed
            | ErrorCode::LlmResponseInvalid
            | ErrorCode::Cancelled => ErrorClass::Fault,
            _ => ErrorClass::Business,
        }
    }

    pub fn is_business(&self) -> bool {
        self.class() == ErrorClass::Business
    }

    /// Wire name, e.g. `FIO_MISMATCH`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FioMismatch => "FIO_MISMATCH",
            ErrorCode::FioMissing => "FIO_MISSING",
            ErrorCode::DocTypeUnknown => "DOC_TYPE_UNKNOWN",
            ErrorCode::DocDateTooOld => "DOC_DATE_TOO_OLD",
            ErrorCode::DocDateTooRecent => "DOC_DATE_TOO_RECENT",
            ErrorCode::DocDateMissing => "DOC_DATE_MISSING",
            ErrorCode::DocDateInvalid => "DOC_DATE_INVALID",
            ErrorCode::MultipleDocuments => "MULTIPLE_DOCUMENTS",
            ErrorCode::FileEmpty => "FILE_EMPTY",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::FileTypeUnsupported => "FILE_TYPE_UNSUPPORTED",
            ErrorCode::OcrFailed => "OCR_FAILED",
            ErrorCode::DocTypeCheckFailed => "DOC_TYPE_CHECK_FAILED",
            ErrorCode::ExtractFailed => "EXTRACT_FAILED",
            ErrorCode::LlmResponseInvalid => "LLM_RESPONSE_INVALID",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unanticipated failure inside the core. Surfaces as a system fault.
#[derive(Error, Debug)]
pub enum PipelineFault {
    #[error("STAGE/{stage}: required output of '{missing}' is absent")]
    MissingStageOutput {
        stage: &'static str,
        missing: &'static str,
    },

    #[error("ADMISSION/{0}")]
    AdmissionClosed(String),

    #[error("CONFIG/{0}")]
    InvalidConfig(String),

    #[error("INTERNAL/{0}")]
    Internal(String),
}
