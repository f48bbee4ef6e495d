//! Margin Core Type Definitions
//!
//! Defines the per-operation values that flow through the annotation pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Document identifier assigned by the document host (a path for file workspaces)
pub type DocumentId = String;

/// Operation identifier (ULID)
pub type OperationId = String;

// =============================================================================
// Extracted Document
// =============================================================================

/// Snapshot of the active document's text at extraction time
///
/// This is a copy: later edits to the live document do not affect an
/// operation that is already in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Document the snapshot was taken from
    pub document_id: DocumentId,
    /// Full document text
    pub raw_text: String,
}

impl ExtractedDocument {
    pub fn new(document_id: impl Into<DocumentId>, raw_text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            raw_text: raw_text.into(),
        }
    }
}

// =============================================================================
// Annotation Kinds and Results
// =============================================================================

/// Kind of request sent to the annotation service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationKind {
    /// Tag generation (`/documents/tags`)
    Tags,
    /// Text correction (`/documents/fix-text`)
    Proofread,
}

impl AnnotationKind {
    /// Service path for this request kind
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            AnnotationKind::Tags => "/documents/tags",
            AnnotationKind::Proofread => "/documents/fix-text",
        }
    }
}

/// Result returned by the annotation service, one variant per request kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnnotationResult {
    /// Ordered tag list; order determines insertion order
    TagList { tags: Vec<String> },
    /// Corrected replacement text
    CorrectedText { text: String },
}

impl AnnotationResult {
    /// Returns the request kind this result answers
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationResult::TagList { .. } => AnnotationKind::Tags,
            AnnotationResult::CorrectedText { .. } => AnnotationKind::Proofread,
        }
    }
}

// =============================================================================
// Render Kind
// =============================================================================

/// How an inline list of items is rendered at the top of a document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    /// `#work #planning`
    #[default]
    Tag,
    /// `[[work]] [[planning]]`
    Wikilink,
    /// One `- item` line per entry
    List,
}

impl std::fmt::Display for RenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderKind::Tag => write!(f, "tag"),
            RenderKind::Wikilink => write!(f, "wikilink"),
            RenderKind::List => write!(f, "list"),
        }
    }
}

impl std::str::FromStr for RenderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tag" | "tags" => Ok(RenderKind::Tag),
            "wikilink" | "link" => Ok(RenderKind::Wikilink),
            "list" | "bullet" => Ok(RenderKind::List),
            _ => Err(format!("Unknown render kind: {}", s)),
        }
    }
}
