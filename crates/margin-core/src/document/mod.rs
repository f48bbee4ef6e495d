//! Document Accessor/Mutator
//!
//! Bridge between the annotation pipeline and the host-owned live document.
//!
//! ## Architecture
//!
//! - [`DocumentHost`]: the editing surface; reports which document is active
//! - [`Document`]: a live document handle (read / write full text)
//! - [`DocumentAccessor`]: the only code that reads or rewrites documents
//!
//! Every mutation re-checks that its target is still the active document,
//! computes the complete new text in memory, and commits it with one write.
//! A failed mutation therefore leaves the document as it was.

pub mod markdown;
mod workspace;

pub use workspace::{FileDocument, FileWorkspace, MemoryDocument, MemoryWorkspace};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::types::{ExtractedDocument, RenderKind};

// =============================================================================
// Host Traits
// =============================================================================

/// A live document owned by the host
#[async_trait]
pub trait Document: Send + Sync {
    /// Host-assigned identifier
    fn id(&self) -> &str;

    /// Reads the full current text
    async fn read(&self) -> CoreResult<String>;

    /// Replaces the full text
    async fn write(&self, text: &str) -> CoreResult<()>;
}

/// Transient reference to a live document
pub type DocumentHandle = Arc<dyn Document>;

/// The host document-editing surface
pub trait DocumentHost: Send + Sync {
    /// Currently focused document, if any
    fn active_document(&self) -> Option<DocumentHandle>;
}

impl<H: DocumentHost + ?Sized> DocumentHost for Arc<H> {
    fn active_document(&self) -> Option<DocumentHandle> {
        (**self).active_document()
    }
}

// =============================================================================
// Accessor
// =============================================================================

/// Reads and rewrites the host's active document
pub struct DocumentAccessor<H> {
    host: H,
}

impl<H: DocumentHost> DocumentAccessor<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Returns the underlying host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the live handle of the focused document, if any
    pub fn active_document_handle(&self) -> Option<DocumentHandle> {
        self.host.active_document()
    }

    /// Snapshots the active document's full text.
    ///
    /// Returns `None` when no document is focused or its text is blank.
    pub async fn extract_content(&self) -> CoreResult<Option<ExtractedDocument>> {
        let Some(handle) = self.active_document_handle() else {
            debug!("No active document to extract");
            return Ok(None);
        };

        let text = handle.read().await?;
        if text.trim().is_empty() {
            debug!(document = handle.id(), "Active document is empty");
            return Ok(None);
        }

        debug!(document = handle.id(), len = text.len(), "Extracted document text");
        Ok(Some(ExtractedDocument::new(handle.id(), text)))
    }

    /// Resolves the live handle for a previously extracted document.
    ///
    /// Fails with [`CoreError::NoActiveDocument`] if that document is no
    /// longer the focused one.
    pub fn resolve_target(&self, document_id: &str) -> CoreResult<DocumentHandle> {
        match self.active_document_handle() {
            Some(handle) if handle.id() == document_id => Ok(handle),
            Some(handle) => Err(CoreError::NoActiveDocument(format!(
                "{} is no longer active (now {})",
                document_id,
                handle.id()
            ))),
            None => Err(CoreError::NoActiveDocument(format!(
                "{} was closed",
                document_id
            ))),
        }
    }

    /// Prepends rendered `items` to the body, after any frontmatter.
    ///
    /// Not idempotent: calling twice inserts twice.
    pub async fn insert_at_top(
        &self,
        handle: &DocumentHandle,
        items: &[String],
        kind: RenderKind,
    ) -> CoreResult<()> {
        let rendered = markdown::render_items(items, kind);
        if rendered.is_empty() {
            debug!(document = handle.id(), "Nothing to insert");
            return Ok(());
        }

        self.edit(handle, |text| Ok(markdown::insert_at_top(text, &rendered)))
            .await?;
        info!(
            document = handle.id(),
            count = items.len(),
            render = %kind,
            "Inserted items at top of document"
        );
        Ok(())
    }

    /// Appends `value` under `property` in the frontmatter block, creating
    /// the block or property when missing.
    pub async fn merge_into_metadata_block(
        &self,
        handle: &DocumentHandle,
        property: &str,
        value: &str,
    ) -> CoreResult<()> {
        self.edit(handle, |text| {
            markdown::merge_into_frontmatter(text, property, value)
        })
        .await
    }

    /// Merges each value in order, committing all of them with one write.
    pub async fn merge_values_into_metadata_block(
        &self,
        handle: &DocumentHandle,
        property: &str,
        values: &[String],
    ) -> CoreResult<()> {
        self.edit(handle, |text| {
            values.iter().try_fold(text.to_string(), |draft, value| {
                markdown::merge_into_frontmatter(&draft, property, value)
            })
        })
        .await?;
        info!(
            document = handle.id(),
            property,
            count = values.len(),
            "Merged values into frontmatter"
        );
        Ok(())
    }

    /// Replaces the entire document text. Destructive; no undo is kept here.
    pub async fn replace_body(&self, handle: &DocumentHandle, new_text: &str) -> CoreResult<()> {
        self.ensure_active(handle)?;
        handle.write(new_text).await.map_err(into_mutation_error)?;
        info!(
            document = handle.id(),
            len = new_text.len(),
            "Replaced document text"
        );
        Ok(())
    }

    fn ensure_active(&self, handle: &DocumentHandle) -> CoreResult<()> {
        self.resolve_target(handle.id()).map(|_| ())
    }

    /// Read-modify-write against the live document with a single commit
    async fn edit<F>(&self, handle: &DocumentHandle, apply: F) -> CoreResult<()>
    where
        F: FnOnce(&str) -> CoreResult<String> + Send,
    {
        self.ensure_active(handle)?;
        let current = handle.read().await.map_err(into_mutation_error)?;
        let updated = apply(&current)?;
        if updated == current {
            return Ok(());
        }

        self.ensure_active(handle)?;
        handle.write(&updated).await.map_err(into_mutation_error)
    }
}

fn into_mutation_error(err: CoreError) -> CoreError {
    match err {
        CoreError::NoActiveDocument(_) | CoreError::MutationFailed(_) => err,
        other => CoreError::MutationFailed(other.to_string()),
    }
}
