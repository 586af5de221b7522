//! Contracts for the OCR and LLM services the pipeline consumes.
//!
//! Implementations live outside this crate. Each call returns a tagged
//! `Result`: a typed payload or a classified failure. Retrying is the
//! adapter's business; the stages only see the final outcome.

use async_trait::async_trait;
use dvp_core::{DocTypeCheck, DocumentRef, OcrPage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Worth retrying later (timeouts, 5xx, rate limits)
    Transient,
    /// Retrying will not help (bad credentials, unreadable file)
    Permanent,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind:?} failure: {message}")]
pub struct AdapterFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl AdapterFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn timeout(service: &str, after: Duration) -> Self {
        Self::transient(format!("{} timed out after {} ms", service, after.as_millis()))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// LLM call outcome. A response that arrived but does not fit the expected
/// record is a `Parse` failure, kept apart from transport problems.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmFailure {
    #[error("LLM transport: {0}")]
    Transport(#[from] AdapterFailure),

    #[error("LLM response does not match the expected shape: {0}")]
    Parse(String),
}

/// Fields read off the document by the extraction model, dates still raw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFields {
    pub fio: Option<String>,
    #[serde(alias = "docDate")]
    pub doc_date: Option<String>,
    /// End of the decree period, when the document has one
    #[serde(alias = "decreeEndDate", alias = "valid_until", alias = "validUntil")]
    pub decree_end_date: Option<String>,
}

#[async_trait]
pub trait OcrAdapter: Send + Sync {
    /// Recognize every page of the document. Called at most once per run.
    async fn extract_pages(&self, document: &DocumentRef) -> Result<Vec<OcrPage>, AdapterFailure>;
}

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Classify the concatenated OCR text
    async fn detect_document_types(&self, text: &str) -> Result<DocTypeCheck, LlmFailure>;

    /// Pull the holder's name and the relevant dates out of the OCR text
    async fn extract_fields(&self, text: &str) -> Result<RawFields, LlmFailure>;
}

/// Run an adapter call under a hard deadline. An elapsed deadline becomes a
/// transient [`AdapterFailure`].
pub async fn call_with_timeout<T, E, F>(service: &str, limit: Duration, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<AdapterFailure>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AdapterFailure::timeout(service, limit).into()),
    }
}

/// Decode a model's JSON answer into a typed record. Tolerates Markdown code
/// fences and prose around the object.
pub fn decode_llm_json<T: DeserializeOwned>(raw: &str) -> Result<T, LlmFailure> {
    let body = strip_code_fence(raw.trim());

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let start = body.find('{');
            let end = body.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => serde_json::from_str(&body[s..=e])
                    .map_err(|err| LlmFailure::Parse(err.to_string())),
                _ => Err(LlmFailure::Parse(first_err.to_string())),
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_json() {
        let fields: RawFields =
            decode_llm_json(r#"{"fio":"Иванов Иван","doc_date":"01.02.2024"}"#).unwrap();
        assert_eq!(fields.fio.as_deref(), Some("Иванов Иван"));
        assert_eq!(fields.decree_end_date, None);
    }

    #[test]
    fn test_decode_fenced_json() {
        let raw = "```json\n{\"detectedTypes\":[\"reference-letter\"],\"isSingleDocType\":true,\"isDocTypeKnown\":true}\n```";
        let check: DocTypeCheck = decode_llm_json(raw).unwrap();
        assert_eq!(check.detected_types, vec!["reference-letter"]);
    }

    #[test]
    fn test_decode_with_prose() {
        let raw = "Here is the result: {\"fio\": null, \"docDate\": \"2024-01-05\", \"validUntil\": \"2025-01-05\"} Hope it helps";
        let fields: RawFields = decode_llm_json(raw).unwrap();
        assert_eq!(fields.doc_date.as_deref(), Some("2024-01-05"));
        assert_eq!(fields.decree_end_date.as_deref(), Some("2025-01-05"));
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let err = decode_llm_json::<DocTypeCheck>(r#"{"detected_types": "one"}"#).unwrap_err();
        assert!(matches!(err, LlmFailure::Parse(_)));
        let err = decode_llm_json::<RawFields>("not json at all").unwrap_err();
        assert!(matches!(err, LlmFailure::Parse(_)));
    }

    #[test]
    fn test_failure_classification() {
        assert!(AdapterFailure::timeout("ocr", Duration::from_millis(5)).is_retryable());
        assert!(!AdapterFailure::permanent("bad file").is_retryable());
        let llm: LlmFailure = AdapterFailure::transient("503").into();
        assert!(matches!(llm, LlmFailure::Transport(_)));
    }

    #[tokio::test]
    async fn test_call_with_timeout_elapses() {
        let result: Result<(), AdapterFailure> =
            call_with_timeout("ocr", Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, FailureKind::Transient);
        assert!(err.message.contains("ocr timed out"));
    }

    #[tokio::test]
    async fn test_call_with_timeout_passes_through() {
        let result: Result<u32, LlmFailure> =
            call_with_timeout("llm", Duration::from_secs(1), async {
                Err(LlmFailure::Parse("x".into()))
            })
            .await;
        assert_eq!(result, Err(LlmFailure::Parse("x".into())));
    }
}
