use async_trait::async_trait;
use dvp_core::{ErrorCode, PipelineFault, RunContext, Stage, StageOutcome, Termination};
use tracing::debug;

use crate::config::Limits;
use crate::ACQUIRE;

/// Admits the uploaded file: non-empty, within the size limit, of an
/// accepted type. Records the content digest.
pub struct AcquireStage {
    max_document_bytes: usize,
    allowed_extensions: Vec<String>,
}

impl AcquireStage {
    pub fn new(limits: &Limits) -> Self {
        Self {
            max_document_bytes: limits.max_document_bytes,
            allowed_extensions: limits
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn admit(&self, ctx: &RunContext) -> Option<ErrorCode> {
        let document = &ctx.document;
        if document.is_empty() {
            return Some(ErrorCode::FileEmpty);
        }
        if document.len() > self.max_document_bytes {
            return Some(ErrorCode::FileTooLarge);
        }
        match document.extension() {
            Some(ext) if self.allowed_extensions.contains(&ext) => None,
            _ => Some(ErrorCode::FileTypeUnsupported),
        }
    }
}

impl Default for AcquireStage {
    fn default() -> Self {
        Self::new(&Limits::default())
    }
}

#[async_trait]
impl Stage for AcquireStage {
    fn id(&self) -> &'static str {
        ACQUIRE
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StageOutcome, PipelineFault> {
        if let Some(code) = self.admit(ctx) {
            return Ok(StageOutcome::Terminate(Termination::fail(code)));
        }

        let digest = ctx.document.digest();
        debug!(
            run_id = %ctx.run_id,
            filename = %ctx.document.filename,
            bytes = ctx.document.len(),
            digest = %digest,
            "document acquired"
        );
        ctx.content_digest = Some(digest);
        Ok(StageOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dvp_core::DocumentRef;

    fn ctx(filename: &str, content: Vec<u8>) -> RunContext {
        RunContext::new(
            DocumentRef::new(filename, content),
            "Иванов Иван",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    fn stage() -> AcquireStage {
        AcquireStage::new(&Limits {
            max_document_bytes: 8,
            allowed_extensions: vec![".PDF".into(), "png".into()],
            ..Limits::default()
        })
    }

    async fn outcome(filename: &str, content: Vec<u8>) -> StageOutcome {
        stage().run(&mut ctx(filename, content)).await.unwrap()
    }

    #[tokio::test]
    async fn test_accepts_document() {
        let mut c = ctx("scan.pdf", b"%PDF".to_vec());
        let outcome = stage().run(&mut c).await.unwrap();
        assert_eq!(outcome, StageOutcome::Continue);
        assert!(c.content_digest.unwrap().starts_with("blake3:"));
    }

    #[tokio::test]
    async fn test_rejections() {
        assert_eq!(
            outcome("scan.pdf", vec![]).await,
            StageOutcome::Terminate(Termination::fail(ErrorCode::FileEmpty))
        );
        assert_eq!(
            outcome("scan.pdf", vec![0u8; 9]).await,
            StageOutcome::Terminate(Termination::fail(ErrorCode::FileTooLarge))
        );
        assert_eq!(
            outcome("scan.docx", vec![1u8]).await,
            StageOutcome::Terminate(Termination::fail(ErrorCode::FileTypeUnsupported))
        );
        assert_eq!(
            outcome("scan", vec![1u8]).await,
            StageOutcome::Terminate(Termination::fail(ErrorCode::FileTypeUnsupported))
        );
    }

    #[tokio::test]
    async fn test_extension_case_insensitive() {
        assert_eq!(outcome("SCAN.PNG", vec![1u8]).await, StageOutcome::Continue);
    }
}
