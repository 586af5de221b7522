use async_trait::async_trait;
use dvp_core::{ErrorCode, PipelineFault, RunContext, Stage, StageOutcome, Termination};
use dvp_policy::parse_optional_date;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::adapters::{call_with_timeout, LlmAdapter, LlmFailure};
use crate::{EXTRACT_FIELDS, EXTRACT_OCR};

/// Extracts the holder's name and the document dates. Dates that fail to
/// parse are left empty for the validate stage to report.
pub struct ExtractFieldsStage {
    llm: Arc<dyn LlmAdapter>,
    timeout: Duration,
}

impl ExtractFieldsStage {
    pub fn new(llm: Arc<dyn LlmAdapter>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl Stage for ExtractFieldsStage {
    fn id(&self) -> &'static str {
        EXTRACT_FIELDS
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StageOutcome, PipelineFault> {
        let text = ctx.ocr_text().ok_or(PipelineFault::MissingStageOutput {
            stage: EXTRACT_FIELDS,
            missing: EXTRACT_OCR,
        })?;

        let raw = match call_with_timeout("llm", self.timeout, self.llm.extract_fields(&text)).await
        {
            Ok(raw) => raw,
            Err(failure) => {
                let code = match &failure {
                    LlmFailure::Transport(_) => ErrorCode::ExtractFailed,
                    LlmFailure::Parse(_) => ErrorCode::LlmResponseInvalid,
                };
                warn!(run_id = %ctx.run_id, error = %failure, code = %code, "field extraction failed");
                return Ok(StageOutcome::Terminate(Termination::fail(code)));
            }
        };

        ctx.extracted.fio = raw
            .fio
            .map(|fio| fio.trim().to_string())
            .filter(|fio| !fio.is_empty());

        ctx.extracted.doc_date = match parse_optional_date(raw.doc_date.as_deref()) {
            Ok(date) => date,
            Err(e) => {
                warn!(run_id = %ctx.run_id, error = %e, "document date rejected");
                ctx.extracted.rejected_dates.extend(raw.doc_date.clone());
                None
            }
        };

        ctx.extracted.decree_end_date = match parse_optional_date(raw.decree_end_date.as_deref()) {
            Ok(date) => date,
            Err(e) => {
                warn!(run_id = %ctx.run_id, error = %e, "decree end date rejected");
                ctx.extracted.rejected_dates.extend(raw.decree_end_date.clone());
                None
            }
        };

        debug!(
            run_id = %ctx.run_id,
            has_fio = ctx.extracted.fio.is_some(),
            doc_date = ?ctx.extracted.doc_date,
            "fields extracted"
        );
        Ok(StageOutcome::Continue)
    }
}
