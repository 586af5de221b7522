//! Pipeline Runner: drives the stages in order and stops at the first termination
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::data_model::TerminalResult;
use crate::error::{ErrorCode, PipelineFault};
use crate::finalizer::ResultFinalizer;
use crate::stage::{Stage, StageOutcome};

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    finalizer: ResultFinalizer,
    pipeline_id: String,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>, finalizer: ResultFinalizer) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join("→");

        Self {
            stages,
            finalizer,
            pipeline_id,
        }
    }

    /// Executes one run. Every classified outcome, success or failure, comes
    /// back as `Ok(TerminalResult)`; `Err` means a system fault.
    pub async fn run(&self, mut ctx: RunContext) -> Result<TerminalResult, PipelineFault> {
        let run_id = ctx.run_id;

        for stage in &self.stages {
            if ctx.cancel.is_cancelled() {
                info!(run_id = %run_id, next_stage = stage.id(), "run cancelled");
                return Ok(self.finalizer.finalize(ctx, Some(ErrorCode::Cancelled), None));
            }

            let start = Instant::now();
            let outcome = stage.run(&mut ctx).await;
            ctx.record_timing(stage.id(), start.elapsed());

            match outcome {
                Ok(StageOutcome::Continue) => {
                    debug!(run_id = %run_id, stage = stage.id(), "stage completed");
                }
                Ok(StageOutcome::Terminate(termination)) => {
                    match termination.code {
                        Some(code) => info!(
                            run_id = %run_id,
                            stage = stage.id(),
                            code = %code,
                            class = ?code.class(),
                            "run terminated early"
                        ),
                        None => info!(
                            run_id = %run_id,
                            stage = stage.id(),
                            errors = ctx.errors.len(),
                            "run completed"
                        ),
                    }
                    return Ok(self
                        .finalizer
                        .finalize(ctx, termination.code, termination.checks));
                }
                Err(fault) => {
                    warn!(run_id = %run_id, stage = stage.id(), error = %fault, "system fault");
                    return Err(fault);
                }
            }
        }

        Err(PipelineFault::Internal(format!(
            "pipeline '{}' ended without a terminal stage",
            self.pipeline_id
        )))
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
