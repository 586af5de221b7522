//! DVP Stages: the five verification stages and the service around them
//!
//! Each stage reads what earlier stages left in the [`RunContext`] and adds
//! its own output. Upstream failures end the run at the stage that hit them;
//! business checks in the last stage accumulate.
//!
//! # Pipeline Flow
//!
//! ```text
//! upload → acquire → extract-ocr → detect-document-type → extract-fields → validate-and-finalize
//!             ↓            ↓                 ↓                    ↓                   ↓
//!          FILE_*     OCR_FAILED    DOC_TYPE_CHECK_FAILED   EXTRACT_FAILED     FIO_*, DOC_*
//!                                   MULTIPLE_DOCUMENTS
//! ```
//!
//! [`RunContext`]: dvp_core::RunContext

mod acquire;
pub mod adapters;
pub mod config;
mod detect_doc_type;
mod extract_fields;
mod extract_ocr;
pub mod service;
mod validate;

pub use acquire::AcquireStage;
pub use adapters::{
    call_with_timeout, decode_llm_json, AdapterFailure, FailureKind, LlmAdapter, LlmFailure,
    OcrAdapter, RawFields,
};
pub use config::{AdapterTimeouts, ConfigError, Limits, VerifierConfig};
pub use detect_doc_type::DetectDocTypeStage;
pub use extract_fields::ExtractFieldsStage;
pub use extract_ocr::ExtractOcrStage;
pub use service::{VerificationRequest, VerificationService};
pub use validate::{ValidateStage, CHECK_DOC_DATE_VALID, CHECK_DOC_TYPE_KNOWN, CHECK_FIO_MATCH};

use dvp_core::{PipelineRunner, ResultFinalizer, Stage};
use dvp_policy::ValidityEngine;
use std::sync::Arc;

// Stage ids, also the keys of the timings map
pub const ACQUIRE: &str = "acquire";
pub const EXTRACT_OCR: &str = "extract-ocr";
pub const DETECT_DOCUMENT_TYPE: &str = "detect-document-type";
pub const EXTRACT_FIELDS: &str = "extract-fields";
pub const VALIDATE_AND_FINALIZE: &str = "validate-and-finalize";

/// Assemble the standard pipeline. The configuration is validated first.
pub fn build_pipeline(
    config: &VerifierConfig,
    ocr: Arc<dyn OcrAdapter>,
    llm: Arc<dyn LlmAdapter>,
) -> Result<PipelineRunner, ConfigError> {
    config.validate()?;
    let engine = Arc::new(ValidityEngine::new(config.policy_table()?));

    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(AcquireStage::new(&config.limits)),
        Box::new(ExtractOcrStage::new(ocr, config.adapters.ocr())),
        Box::new(DetectDocTypeStage::new(llm.clone(), config.adapters.llm())),
        Box::new(ExtractFieldsStage::new(llm, config.adapters.llm())),
        Box::new(ValidateStage::new(config.matching, engine)),
    ];

    let finalizer = ResultFinalizer::new(Arc::new(config.catalog()));
    Ok(PipelineRunner::new(stages, finalizer))
}
