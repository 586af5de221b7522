use async_trait::async_trait;
use dvp_core::{ErrorCode, PipelineFault, RunContext, Stage, StageOutcome, Termination};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::adapters::{call_with_timeout, OcrAdapter};
use crate::EXTRACT_OCR;

/// Calls the OCR service exactly once and stores the recognized pages
pub struct ExtractOcrStage {
    ocr: Arc<dyn OcrAdapter>,
    timeout: Duration,
}

impl ExtractOcrStage {
    pub fn new(ocr: Arc<dyn OcrAdapter>, timeout: Duration) -> Self {
        Self { ocr, timeout }
    }
}

#[async_trait]
impl Stage for ExtractOcrStage {
    fn id(&self) -> &'static str {
        EXTRACT_OCR
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StageOutcome, PipelineFault> {
        let pages =
            match call_with_timeout("ocr", self.timeout, self.ocr.extract_pages(&ctx.document))
                .await
            {
                Ok(pages) => pages,
                Err(failure) => {
                    warn!(
                        run_id = %ctx.run_id,
                        retryable = failure.is_retryable(),
                        error = %failure,
                        "ocr failed"
                    );
                    return Ok(StageOutcome::Terminate(Termination::fail(ErrorCode::OcrFailed)));
                }
            };

        if pages.iter().all(|p| p.text.trim().is_empty()) {
            warn!(run_id = %ctx.run_id, pages = pages.len(), "ocr returned no text");
            return Ok(StageOutcome::Terminate(Termination::fail(ErrorCode::OcrFailed)));
        }

        debug!(run_id = %ctx.run_id, pages = pages.len(), "ocr completed");
        ctx.ocr_pages = Some(pages);
        Ok(StageOutcome::Continue)
    }
}
