//! DVP Core: run context, stage contract, executor and result finalizer
//!
//! A run moves through a fixed list of stages sharing one [`RunContext`].
//! The first stage that asks to terminate ends the run; the
//! [`ResultFinalizer`] turns the context into the single [`TerminalResult`]
//! the run emits.
//!
//! ```text
//! acquire → extract-ocr → detect-document-type → extract-fields → validate-and-finalize
//!    ↓           ↓                 ↓                     ↓                   ↓
//!    └───────────┴──── Terminate ──┴─────────────────────┴───────────────────┘
//!                                  ↓
//!                           ResultFinalizer → TerminalResult
//! ```

pub mod catalog;
pub mod context;
pub mod data_model;
pub mod error;
pub mod finalizer;
pub mod runner;
pub mod stage;

pub use catalog::{MessageCatalog, StaticCatalog};
pub use context::{CancelSignal, DocumentRef, RunContext};
pub use data_model::{
    normalize_type_key, Checks, DocTypeCheck, ErrorEntry, ExtractedFields, OcrPage,
    TerminalResult, Timings,
};
pub use error::{ErrorClass, ErrorCode, PipelineFault};
pub use finalizer::ResultFinalizer;
pub use runner::PipelineRunner;
pub use stage::{Stage, StageOutcome, Termination};
