//! Result Finalizer: the one place a `TerminalResult` is assembled
use std::sync::Arc;

use crate::catalog::MessageCatalog;
use crate::context::RunContext;
use crate::data_model::{Checks, ErrorEntry, TerminalResult};
use crate::error::ErrorCode;

#[derive(Clone)]
pub struct ResultFinalizer {
    catalog: Arc<dyn MessageCatalog>,
}

impl ResultFinalizer {
    pub fn new(catalog: Arc<dyn MessageCatalog>) -> Self {
        Self { catalog }
    }

    /// Consumes the context. `code` is appended after any errors the stages
    /// already accumulated; the verdict holds only when the list ends up empty.
    pub fn finalize(
        &self,
        ctx: RunContext,
        code: Option<ErrorCode>,
        checks: Option<Checks>,
    ) -> TerminalResult {
        let RunContext {
            run_id,
            mut errors,
            extracted,
            timings,
            ..
        } = ctx;

        if let Some(code) = code {
            if !errors.contains(&code) {
                errors.push(code);
            }
        }

        let errors: Vec<ErrorEntry> = errors
            .into_iter()
            .map(|code| ErrorEntry {
                code,
                message: self.catalog.lookup(code),
            })
            .collect();

        TerminalResult {
            run_id,
            verdict: errors.is_empty(),
            errors,
            extracted,
            timings,
            checks: checks.unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for ResultFinalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultFinalizer").finish_non_exhaustive()
    }
}
