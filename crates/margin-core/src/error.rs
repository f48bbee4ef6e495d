//! Margin Error Definitions
//!
//! Defines error types used throughout the annotation pipeline.

use thiserror::Error;

/// Core pipeline error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Extraction Errors
    // =========================================================================
    #[error("No content to annotate")]
    NoContent,

    // =========================================================================
    // Remote Service Errors
    // =========================================================================
    #[error("Annotation service returned HTTP {status}")]
    RemoteService { status: u16, body: String },

    #[error("Malformed response from annotation service: {0}")]
    MalformedResponse(String),

    #[error("Invalid service URL: {0}")]
    InvalidServiceUrl(String),

    #[error("Request to annotation service failed: {0}")]
    RequestFailed(String),

    // =========================================================================
    // Document Errors
    // =========================================================================
    #[error("No active document: {0}")]
    NoActiveDocument(String),

    #[error("Document mutation failed: {0}")]
    MutationFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core pipeline result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns the HTTP status for remote service failures
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::RemoteService { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error originated on the remote side of the pipeline
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CoreError::RemoteService { .. }
                | CoreError::MalformedResponse(_)
                | CoreError::InvalidServiceUrl(_)
                | CoreError::RequestFailed(_)
        )
    }
}
