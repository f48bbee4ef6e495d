//! Document hosts
//!
//! - [`FileWorkspace`]: the active document is a markdown file on disk
//! - [`MemoryWorkspace`]: in-memory documents for tests and embedding hosts

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Document, DocumentHandle, DocumentHost};
use crate::error::{CoreError, CoreResult};

// =============================================================================
// File Workspace
// =============================================================================

/// A note stored as a file on disk
pub struct FileDocument {
    path: PathBuf,
    id: String,
}

impl FileDocument {
    pub fn new(path: PathBuf) -> Self {
        let id = path.to_string_lossy().to_string();
        Self { path, id }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Document for FileDocument {
    fn id(&self) -> &str {
        &self.id
    }

    async fn read(&self) -> CoreResult<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::NoActiveDocument(format!("{} not found", self.id)))
            }
            Err(e) => Err(CoreError::IoError(e)),
        }
    }

    async fn write(&self, text: &str) -> CoreResult<()> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(CoreError::NoActiveDocument(format!(
                "{} was removed",
                self.id
            )));
        }

        let path = self.path.clone();
        let bytes = text.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || crate::fs::atomic_write_bytes(&path, &bytes))
            .await
            .map_err(|e| CoreError::Internal(format!("Write task failed: {}", e)))?
            .map_err(|e| CoreError::MutationFailed(e.to_string()))?;

        debug!(document = %self.id, len = text.len(), "Wrote document");
        Ok(())
    }
}

/// Workspace whose active document is a file path
#[derive(Default)]
pub struct FileWorkspace {
    active: RwLock<Option<PathBuf>>,
}

impl FileWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path` as the active document
    pub fn open(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|_| {
            CoreError::ValidationError(format!("note not found: {}", path.display()))
        })?;
        if !meta.is_file() {
            return Err(CoreError::ValidationError(format!(
                "note is not a file: {}",
                path.display()
            )));
        }

        let mut active = self
            .active
            .write()
            .map_err(|_| CoreError::Internal("workspace lock poisoned".to_string()))?;
        *active = Some(path.to_path_buf());
        Ok(())
    }

    /// Clears the active document
    pub fn close(&self) {
        match self.active.write() {
            Ok(mut active) => *active = None,
            Err(_) => warn!("Workspace lock poisoned while closing document"),
        }
    }

    /// Path of the active document, if any
    pub fn active_path(&self) -> Option<PathBuf> {
        self.active.read().ok().and_then(|active| active.clone())
    }
}

impl DocumentHost for FileWorkspace {
    fn active_document(&self) -> Option<DocumentHandle> {
        self.active_path()
            .map(|path| Arc::new(FileDocument::new(path)) as DocumentHandle)
    }
}

// =============================================================================
// Memory Workspace
// =============================================================================

/// In-memory document
pub struct MemoryDocument {
    id: String,
    text: Mutex<String>,
    open: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocument {
    fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: Mutex::new(text.to_string()),
            open: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Current text, regardless of whether the document is open
    pub fn text(&self) -> String {
        match self.text.lock() {
            Ok(text) => text.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes subsequent writes fail with a host error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn set_text(&self, text: &str) {
        if let Ok(mut current) = self.text.lock() {
            *current = text.to_string();
        }
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoreError::NoActiveDocument(format!("{} is closed", self.id)))
        }
    }
}

#[async_trait]
impl Document for MemoryDocument {
    fn id(&self) -> &str {
        &self.id
    }

    async fn read(&self) -> CoreResult<String> {
        self.ensure_open()?;
        Ok(self.text())
    }

    async fn write(&self, text: &str) -> CoreResult<()> {
        self.ensure_open()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::MutationFailed(format!(
                "{} rejected the write",
                self.id
            )));
        }

        let mut current = self
            .text
            .lock()
            .map_err(|_| CoreError::Internal("document lock poisoned".to_string()))?;
        *current = text.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Workspace holding documents in memory
#[derive(Default)]
pub struct MemoryWorkspace {
    documents: Mutex<HashMap<String, Arc<MemoryDocument>>>,
    active: Mutex<Option<String>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or reopens) a document with `text` and focuses it
    pub fn open(&self, id: &str, text: &str) -> Arc<MemoryDocument> {
        let document = Arc::new(MemoryDocument::new(id, text));
        if let Ok(mut documents) = self.documents.lock() {
            if let Some(previous) = documents.insert(id.to_string(), Arc::clone(&document)) {
                previous.open.store(false, Ordering::SeqCst);
            }
        }
        self.set_active(Some(id.to_string()));
        document
    }

    /// Focuses an already open document
    pub fn switch_to(&self, id: &str) -> bool {
        let known = self
            .documents
            .lock()
            .map(|documents| documents.contains_key(id))
            .unwrap_or(false);
        if known {
            self.set_active(Some(id.to_string()));
        }
        known
    }

    /// Closes the focused document; its handles stop accepting reads and writes
    pub fn close(&self) {
        let active = self.active.lock().ok().and_then(|mut active| active.take());
        if let Some(document) = active.and_then(|id| self.document(&id)) {
            document.open.store(false, Ordering::SeqCst);
        }
    }

    /// Replaces a document's text as a user edit would
    pub fn set_text(&self, id: &str, text: &str) {
        if let Some(document) = self.document(id) {
            document.set_text(text);
        }
    }

    pub fn document(&self, id: &str) -> Option<Arc<MemoryDocument>> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(id).cloned())
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.document(id).map(|document| document.text())
    }

    fn set_active(&self, id: Option<String>) {
        if let Ok(mut active) = self.active.lock() {
            *active = id;
        }
    }
}

impl DocumentHost for MemoryWorkspace {
    fn active_document(&self) -> Option<DocumentHandle> {
        let id = self.active.lock().ok().and_then(|active| active.clone())?;
        self.document(&id).map(|document| document as DocumentHandle)
    }
}
