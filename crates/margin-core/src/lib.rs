//! Margin Core Library
//!
//! Annotates markdown documents with output from a remote text-generation
//! service: tags inserted at the top of the body, tags merged into the
//! frontmatter, or a proofread replacement of the whole text.
//!
//! The pipeline is composed leaf-up:
//! - [`client`]: request/response mapping for the annotation service
//! - [`document`]: the only code that reads or rewrites live documents
//! - [`orchestrator`]: runs one operation through extract, call and mutate

pub mod client;
pub mod document;
pub mod error;
pub mod fs;
pub mod notify;
pub mod orchestrator;
pub mod settings;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{AnnotationClient, HttpAnnotationClient};
pub use document::{DocumentAccessor, DocumentHost, FileWorkspace, MemoryWorkspace};
pub use error::{CoreError, CoreResult};
pub use notify::{Notifier, ProgressGuard, RecordingNotifier};
pub use orchestrator::{
    AnnotationOrchestrator, FailureReason, Operation, OperationOutcome, OperationReport,
    OperationStage,
};
pub use settings::{AppSettings, ConfigStore, Configuration, MemoryConfigStore, SettingsManager};
pub use types::{AnnotationKind, AnnotationResult, ExtractedDocument, RenderKind};
