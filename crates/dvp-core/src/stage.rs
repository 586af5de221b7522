//! Stage Trait: single contract for every pipeline stage
use async_trait::async_trait;

use crate::context::RunContext;
use crate::data_model::Checks;
use crate::error::{ErrorCode, PipelineFault};

/// Request to end the run, handed to the finalizer by the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub code: Option<ErrorCode>,
    pub checks: Option<Checks>,
}

impl Termination {
    /// Early failure with a single code
    pub fn fail(code: ErrorCode) -> Self {
        Self {
            code: Some(code),
            checks: None,
        }
    }

    /// Normal end of the pipeline; errors already sit in the context
    pub fn complete(checks: Checks) -> Self {
        Self {
            code: None,
            checks: Some(checks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Terminate(Termination),
}

#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable id used as the timing key (ex: "extract-ocr")
    fn id(&self) -> &'static str;

    /// Runs the stage. Expected business and upstream conditions come back as
    /// `Terminate`; `Err` is reserved for faults.
    async fn run(&self, ctx: &mut RunContext) -> Result<StageOutcome, PipelineFault>;
}
