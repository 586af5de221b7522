use async_trait::async_trait;
use dvp_core::{Checks, ErrorCode, PipelineFault, RunContext, Stage, StageOutcome, Termination};
use dvp_match::{canonicalize, canonicalize_as, match_variants, MatchConfig, NameRole};
use dvp_policy::ValidityEngine;
use std::sync::Arc;
use tracing::debug;

use crate::{DETECT_DOCUMENT_TYPE, VALIDATE_AND_FINALIZE};

pub const CHECK_FIO_MATCH: &str = "fio_match";
pub const CHECK_DOC_TYPE_KNOWN: &str = "doc_type_known";
pub const CHECK_DOC_DATE_VALID: &str = "doc_date_valid";

/// Runs every business check and ends the run. Failed checks accumulate;
/// none of them stops the others.
pub struct ValidateStage {
    matching: MatchConfig,
    engine: Arc<ValidityEngine>,
}

impl ValidateStage {
    pub fn new(matching: MatchConfig, engine: Arc<ValidityEngine>) -> Self {
        Self { matching, engine }
    }

    fn check_fio(&self, ctx: &mut RunContext, checks: &mut Checks) {
        let document = ctx
            .extracted
            .fio
            .as_deref()
            .map(|fio| canonicalize_as(fio, NameRole::Document))
            .filter(|set| !set.is_empty());

        let passed = match document {
            None => {
                ctx.push_error(ErrorCode::FioMissing);
                false
            }
            Some(document) => {
                let applicant = canonicalize(&ctx.applicant_name);
                let result = match_variants(&applicant, &document, &self.matching);
                debug!(
                    run_id = %ctx.run_id,
                    matched = result.matched,
                    strategy = ?result.strategy,
                    score = result.score,
                    "fio compared"
                );
                if !result.matched {
                    ctx.push_error(ErrorCode::FioMismatch);
                }
                result.matched
            }
        };
        checks.insert(CHECK_FIO_MATCH.to_string(), passed);
    }

    fn check_document(&self, ctx: &mut RunContext, checks: &mut Checks) -> Result<(), PipelineFault> {
        let known = ctx
            .doc_type_check
            .as_ref()
            .map(|c| c.is_doc_type_known)
            .ok_or(PipelineFault::MissingStageOutput {
                stage: VALIDATE_AND_FINALIZE,
                missing: DETECT_DOCUMENT_TYPE,
            })?;

        let doc_type = match ctx.extracted.doc_type.clone() {
            Some(doc_type) if known => doc_type,
            _ => {
                ctx.push_error(ErrorCode::DocTypeUnknown);
                checks.insert(CHECK_DOC_TYPE_KNOWN.to_string(), false);
                return Ok(());
            }
        };

        // Decree-based documents are judged by the end of the decree period,
        // falling back to the issue date when no end date was found
        let date = match self.engine.policy(&doc_type) {
            Some(policy) if policy.is_decree_based => ctx
                .extracted
                .decree_end_date
                .or(ctx.extracted.doc_date),
            _ => ctx.extracted.doc_date,
        };

        let mut validity = self
            .engine
            .check_validity(&doc_type, date, ctx.reference_date);
        // A date was printed but could not be read as a calendar date
        if validity.code == Some(ErrorCode::DocDateMissing)
            && !ctx.extracted.rejected_dates.is_empty()
        {
            validity.code = Some(ErrorCode::DocDateInvalid);
        }
        debug!(
            run_id = %ctx.run_id,
            doc_type = %doc_type,
            age_days = ?validity.age_days,
            valid = validity.valid,
            "document validity checked"
        );

        let type_known = validity.code != Some(ErrorCode::DocTypeUnknown);
        checks.insert(CHECK_DOC_TYPE_KNOWN.to_string(), type_known);
        if type_known {
            checks.insert(CHECK_DOC_DATE_VALID.to_string(), validity.valid);
        }
        if let Some(code) = validity.code {
            ctx.push_error(code);
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for ValidateStage {
    fn id(&self) -> &'static str {
        VALIDATE_AND_FINALIZE
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StageOutcome, PipelineFault> {
        let mut checks = Checks::new();
        self.check_fio(ctx, &mut checks);
        self.check_document(ctx, &mut checks)?;
        Ok(StageOutcome::Terminate(Termination::complete(checks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use dvp_core::{DocTypeCheck, DocumentRef};
    use dvp_policy::{PolicyTable, ValidityPolicy};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn stage() -> ValidateStage {
        let table = PolicyTable::new(vec![
            ValidityPolicy::new("reference-letter", 30).with_min_age(10),
            ValidityPolicy::new("childcare-leave-order", 0).decree_based(),
        ])
        .unwrap();
        ValidateStage::new(MatchConfig::default(), Arc::new(ValidityEngine::new(table)))
    }

    fn ctx(doc_type: &str, fio: Option<&str>, age: Option<i64>) -> RunContext {
        let mut c = RunContext::new(
            DocumentRef::new("a.pdf", vec![1u8]),
            "Иванов Иван Иванович",
            today(),
        );
        c.doc_type_check = Some(DocTypeCheck {
            detected_types: vec![doc_type.to_string()],
            is_single_doc_type: true,
            is_doc_type_known: true,
        });
        c.extracted.doc_type = Some(doc_type.to_string());
        c.extracted.fio = fio.map(String::from);
        c.extracted.doc_date = age.map(|a| today() - Duration::days(a));
        c
    }

    async fn validate(mut c: RunContext) -> (RunContext, Checks) {
        match stage().run(&mut c).await.unwrap() {
            StageOutcome::Terminate(Termination { code: None, checks: Some(checks) }) => (c, checks),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let (c, checks) = validate(ctx("reference-letter", Some("Иванов И.И."), Some(20))).await;
        assert!(c.errors.is_empty());
        assert_eq!(checks.get(CHECK_FIO_MATCH), Some(&true));
        assert_eq!(checks.get(CHECK_DOC_DATE_VALID), Some(&true));
    }

    #[tokio::test]
    async fn test_errors_aggregate() {
        let (c, checks) =
            validate(ctx("reference-letter", Some("Петров Петр Петрович"), Some(40))).await;
        assert_eq!(c.errors, vec![ErrorCode::FioMismatch, ErrorCode::DocDateTooOld]);
        assert_eq!(checks.get(CHECK_FIO_MATCH), Some(&false));
        assert_eq!(checks.get(CHECK_DOC_DATE_VALID), Some(&false));
    }

    #[tokio::test]
    async fn test_missing_fio_and_date() {
        let (c, _) = validate(ctx("reference-letter", None, None)).await;
        assert_eq!(c.errors, vec![ErrorCode::FioMissing, ErrorCode::DocDateMissing]);

        let (c, _) = validate(ctx("reference-letter", Some(" ... "), Some(15))).await;
        assert_eq!(c.errors, vec![ErrorCode::FioMissing]);
    }

    #[tokio::test]
    async fn test_unreadable_date_is_invalid_not_missing() {
        let mut c = ctx("reference-letter", Some("Иванов Иван Иванович"), None);
        c.extracted.rejected_dates.push("31.04.2024".to_string());
        let (c, checks) = validate(c).await;
        assert_eq!(c.errors, vec![ErrorCode::DocDateInvalid]);
        assert_eq!(checks.get(CHECK_DOC_DATE_VALID), Some(&false));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let (c, checks) = validate(ctx("passport", Some("Иванов Иван Иванович"), Some(1))).await;
        assert_eq!(c.errors, vec![ErrorCode::DocTypeUnknown]);
        assert_eq!(checks.get(CHECK_DOC_TYPE_KNOWN), Some(&false));
        assert_eq!(checks.get(CHECK_DOC_DATE_VALID), None);

        let mut flagged = ctx("reference-letter", Some("Иванов Иван Иванович"), Some(15));
        if let Some(check) = flagged.doc_type_check.as_mut() {
            check.is_doc_type_known = false;
        }
        let (c, _) = validate(flagged).await;
        assert_eq!(c.errors, vec![ErrorCode::DocTypeUnknown]);
    }

    #[tokio::test]
    async fn test_decree_end_date_preferred() {
        // Order issued two years ago, decree runs for another month
        let mut c = ctx("childcare-leave-order", Some("Иванов Иван Иванович"), Some(730));
        c.extracted.decree_end_date = Some(today() + Duration::days(30));
        let (c, _) = validate(c).await;
        assert!(c.errors.is_empty());

        // No end date found: the issue date is used instead
        let c = ctx("childcare-leave-order", Some("Иванов Иван Иванович"), Some(730));
        let (c, _) = validate(c).await;
        assert_eq!(c.errors, vec![ErrorCode::DocDateTooOld]);
    }

    #[tokio::test]
    async fn test_missing_detection_output_is_fault() {
        let mut c = ctx("reference-letter", Some("Иванов Иван Иванович"), Some(15));
        c.doc_type_check = None;
        assert!(matches!(
            stage().run(&mut c).await,
            Err(PipelineFault::MissingStageOutput { .. })
        ));
    }
}
