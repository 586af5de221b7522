//! Service shell: admission control in front of the pipeline
//!
//! Runs are independent and may overlap; a semaphore bounds how many are in
//! flight at once. Callers over the limit wait for a permit.

use chrono::NaiveDate;
use dvp_core::{CancelSignal, DocumentRef, PipelineFault, PipelineRunner, RunContext, TerminalResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::adapters::{LlmAdapter, OcrAdapter};
use crate::config::{ConfigError, VerifierConfig};
use crate::build_pipeline;

/// One document to verify against one applicant
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub filename: String,
    pub content: Vec<u8>,
    pub applicant_name: String,
    /// Day the validity window is measured from; today when absent
    pub reference_date: Option<NaiveDate>,
}

impl VerificationRequest {
    pub fn new(
        filename: impl Into<String>,
        content: Vec<u8>,
        applicant_name: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content,
            applicant_name: applicant_name.into(),
            reference_date: None,
        }
    }

    pub fn on(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = Some(reference_date);
        self
    }

    fn into_context(self) -> RunContext {
        let reference_date = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        RunContext::new(
            DocumentRef::new(self.filename, self.content),
            self.applicant_name,
            reference_date,
        )
    }
}

#[derive(Clone)]
pub struct VerificationService {
    runner: Arc<PipelineRunner>,
    admission: Arc<Semaphore>,
}

impl VerificationService {
    pub fn new(runner: PipelineRunner, max_concurrent_runs: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            admission: Arc::new(Semaphore::new(max_concurrent_runs)),
        }
    }

    /// Build the standard five-stage pipeline from configuration
    pub fn from_config(
        config: &VerifierConfig,
        ocr: Arc<dyn OcrAdapter>,
        llm: Arc<dyn LlmAdapter>,
    ) -> Result<Self, ConfigError> {
        let runner = build_pipeline(config, ocr, llm)?;
        info!(
            pipeline = runner.pipeline_id(),
            max_concurrent_runs = config.limits.max_concurrent_runs,
            "verification service ready"
        );
        Ok(Self::new(runner, config.limits.max_concurrent_runs))
    }

    pub async fn verify(&self, request: VerificationRequest) -> Result<TerminalResult, PipelineFault> {
        self.verify_with_cancel(request, CancelSignal::new()).await
    }

    /// Verify one document. The run is abandoned with `CANCELLED` once
    /// `cancel` fires; the stage in progress finishes first.
    pub async fn verify_with_cancel(
        &self,
        request: VerificationRequest,
        cancel: CancelSignal,
    ) -> Result<TerminalResult, PipelineFault> {
        let _permit = self
            .admission
            .acquire()
            .await
            .map_err(|_| PipelineFault::AdmissionClosed("service is shutting down".to_string()))?;

        let ctx = request.into_context().with_cancel(cancel);
        debug!(
            run_id = %ctx.run_id,
            filename = %ctx.document.filename,
            bytes = ctx.document.len(),
            "run admitted"
        );
        self.runner.run(ctx).await
    }

    pub fn available_permits(&self) -> usize {
        self.admission.available_permits()
    }

    /// Stop admitting runs. Runs already in flight finish normally.
    pub fn close(&self) {
        self.admission.close();
    }

    pub fn pipeline_id(&self) -> &str {
        self.runner.pipeline_id()
    }
}
