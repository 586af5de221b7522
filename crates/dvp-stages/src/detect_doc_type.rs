use async_trait::async_trait;
use dvp_core::{ErrorCode, PipelineFault, RunContext, Stage, StageOutcome, Termination};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::adapters::{call_with_timeout, LlmAdapter, LlmFailure};
use crate::{DETECT_DOCUMENT_TYPE, EXTRACT_OCR};

/// Asks the classifier which document types the upload contains. More than
/// one ends the run with `MULTIPLE_DOCUMENTS`.
pub struct DetectDocTypeStage {
    llm: Arc<dyn LlmAdapter>,
    timeout: Duration,
}

impl DetectDocTypeStage {
    pub fn new(llm: Arc<dyn LlmAdapter>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl Stage for DetectDocTypeStage {
    fn id(&self) -> &'static str {
        DETECT_DOCUMENT_TYPE
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StageOutcome, PipelineFault> {
        let text = ctx.ocr_text().ok_or(PipelineFault::MissingStageOutput {
            stage: DETECT_DOCUMENT_TYPE,
            missing: EXTRACT_OCR,
        })?;

        let check =
            match call_with_timeout("llm", self.timeout, self.llm.detect_document_types(&text))
                .await
            {
                Ok(check) => check,
                Err(failure) => {
                    let code = match &failure {
                        LlmFailure::Transport(_) => ErrorCode::DocTypeCheckFailed,
                        LlmFailure::Parse(_) => ErrorCode::LlmResponseInvalid,
                    };
                    warn!(run_id = %ctx.run_id, error = %failure, code = %code, "document type check failed");
                    return Ok(StageOutcome::Terminate(Termination::fail(code)));
                }
            };

        let types = check.distinct_types();
        let multiple = check.has_multiple_documents();
        ctx.extracted.doc_type = types.first().cloned();
        ctx.extracted.is_single_doc_type = Some(!multiple);
        ctx.doc_type_check = Some(check);

        if multiple {
            info!(run_id = %ctx.run_id, types = ?types, "upload holds several documents");
            return Ok(StageOutcome::Terminate(Termination::fail(
                ErrorCode::MultipleDocuments,
            )));
        }

        debug!(run_id = %ctx.run_id, doc_type = ?ctx.extracted.doc_type, "document type detected");
        Ok(StageOutcome::Continue)
    }
}
