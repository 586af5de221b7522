//! Run Context: state threaded through every stage of one run
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::data_model::{DocTypeCheck, ExtractedFields, OcrPage, Timings};
use crate::error::ErrorCode;

/// The uploaded file as received
#[derive(Debug, Clone)]
pub struct DocumentRef {
    pub filename: String,
    pub content: Arc<[u8]>,
}

impl DocumentRef {
    pub fn new(filename: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Lowercased extension of the filename, if any
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn digest(&self) -> String {
        format!("blake3:{}", blake3::hash(&self.content))
    }
}

/// Cooperative cancellation flag, checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub document: DocumentRef,
    /// Name the applicant typed in; treated as authoritative
    pub applicant_name: String,
    /// "Today" for age computations
    pub reference_date: NaiveDate,
    pub content_digest: Option<String>,
    pub timings: Timings,
    pub errors: Vec<ErrorCode>,
    pub extracted: ExtractedFields,
    pub ocr_pages: Option<Vec<OcrPage>>,
    pub doc_type_check: Option<DocTypeCheck>,
    pub cancel: CancelSignal,
}

impl RunContext {
    pub fn new(
        document: DocumentRef,
        applicant_name: impl Into<String>,
        reference_date: NaiveDate,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            document,
            applicant_name: applicant_name.into(),
            reference_date,
            content_digest: None,
            timings: Timings::new(),
            errors: Vec::new(),
            extracted: ExtractedFields::default(),
            ocr_pages: None,
            doc_type_check: None,
            cancel: CancelSignal::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn record_timing(&mut self, stage: &str, elapsed: Duration) {
        self.timings
            .insert(stage.to_string(), elapsed.as_millis() as u64);
    }

    /// Append a failed check. A code is recorded at most once.
    pub fn push_error(&mut self, code: ErrorCode) {
        if !self.errors.contains(&code) {
            self.errors.push(code);
        }
    }

    /// Text of every recognized page joined in page order
    pub fn ocr_text(&self) -> Option<String> {
        let pages = self.ocr_pages.as_ref()?;
        let mut ordered: Vec<&OcrPage> = pages.iter().collect();
        ordered.sort_by_key(|p| p.page_number);
        Some(
            ordered
                .iter()
                .map(|p| p.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    }
}
