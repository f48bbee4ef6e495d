//! Annotation Orchestrator
//!
//! Drives one user-triggered operation through
//! `Extracting -> Calling -> Mutating` and ends in `Done` or `Failed`.
//! Stages only move forward and nothing is retried. Errors never escape
//! [`AnnotationOrchestrator::run`]; they are folded into the returned
//! [`OperationReport`].

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, error, info, info_span, Instrument};

use crate::client::AnnotationClient;
use crate::document::{DocumentAccessor, DocumentHost};
use crate::error::{CoreError, CoreResult};
use crate::notify::{Notifier, ProgressGuard};
use crate::settings::{ConfigStore, Configuration};
use crate::types::{
    AnnotationKind, AnnotationResult, DocumentId, ExtractedDocument, OperationId, RenderKind,
};

/// Name shown in user-facing notices
pub const APP_NAME: &str = "margin";

/// Notice shown when there is nothing to send
pub const NO_CONTENT_NOTICE: &str = "No text in note";

// =============================================================================
// Operation Model
// =============================================================================

/// A user-triggered annotation operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    /// Generate tags and prepend them to the body
    TagAtTop { render: RenderKind },
    /// Generate tags and merge them into the frontmatter
    TagInMetadata,
    /// Replace the document with corrected text
    Proofread,
}

impl Operation {
    /// Service request this operation needs
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Operation::TagAtTop { .. } | Operation::TagInMetadata => AnnotationKind::Tags,
            Operation::Proofread => AnnotationKind::Proofread,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::TagAtTop { .. } => write!(f, "tag-at-top"),
            Operation::TagInMetadata => write!(f, "tag-in-metadata"),
            Operation::Proofread => write!(f, "proofread"),
        }
    }
}

/// Non-terminal stage of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStage {
    Extracting,
    Calling,
    Mutating,
}

/// Why a run failed
#[derive(Debug)]
pub enum FailureReason {
    /// No active document, or its text was blank
    NoContent,
    /// The active document could not be read; nothing was sent
    Unreadable(CoreError),
    /// The remote call failed; the document was not touched
    Remote(CoreError),
    /// The edit could not be committed; the remote result was discarded
    Mutation(CoreError),
}

impl FailureReason {
    /// Stable short code used in reports
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::NoContent => "noContent",
            FailureReason::Unreadable(_) => "unreadable",
            FailureReason::Remote(_) => "remote",
            FailureReason::Mutation(_) => "mutation",
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            FailureReason::NoContent => None,
            FailureReason::Unreadable(err)
            | FailureReason::Remote(err)
            | FailureReason::Mutation(err) => Some(err),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NoContent => write!(f, "{}", NO_CONTENT_NOTICE),
            FailureReason::Unreadable(err) => write!(f, "Cannot read note: {}", err),
            FailureReason::Remote(err) | FailureReason::Mutation(err) => write!(f, "{}", err),
        }
    }
}

/// Terminal state of a run
#[derive(Debug)]
pub enum OperationOutcome {
    Done,
    Failed(FailureReason),
}

impl OperationOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, OperationOutcome::Done)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeView<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl Serialize for OperationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OperationOutcome::Done => OutcomeView {
                status: "done",
                reason: None,
                http_status: None,
                message: None,
            }
            .serialize(serializer),
            OperationOutcome::Failed(reason) => {
                let message = reason.to_string();
                OutcomeView {
                    status: "failed",
                    reason: Some(reason.code()),
                    http_status: reason.error().and_then(CoreError::status),
                    message: Some(&message),
                }
                .serialize(serializer)
            }
        }
    }
}

/// Summary of one run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub id: OperationId,
    pub operation: Operation,
    pub document_id: Option<DocumentId>,
    /// Stages entered, in order
    pub stages: Vec<OperationStage>,
    pub outcome: OperationOutcome,
    /// Result obtained from the service, even if it was not applied
    pub result: Option<AnnotationResult>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl OperationReport {
    fn new(id: OperationId, operation: Operation) -> Self {
        Self {
            id,
            operation,
            document_id: None,
            stages: Vec::new(),
            outcome: OperationOutcome::Done,
            result: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    fn enter(&mut self, stage: OperationStage) {
        debug!(?stage, "Entering stage");
        self.stages.push(stage);
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_done()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs annotation operations against the host's active document
pub struct AnnotationOrchestrator<H> {
    client: Arc<dyn AnnotationClient>,
    accessor: DocumentAccessor<H>,
    config: Arc<dyn ConfigStore>,
    notifier: Arc<dyn Notifier>,
}

impl<H: DocumentHost> AnnotationOrchestrator<H> {
    pub fn new(
        client: Arc<dyn AnnotationClient>,
        accessor: DocumentAccessor<H>,
        config: Arc<dyn ConfigStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            accessor,
            config,
            notifier,
        }
    }

    pub fn accessor(&self) -> &DocumentAccessor<H> {
        &self.accessor
    }

    /// Runs one operation to a terminal outcome.
    ///
    /// Runs are independent: overlapping runs are not serialized and the
    /// last mutation to commit wins.
    pub async fn run(&self, operation: Operation) -> OperationReport {
        let id = ulid::Ulid::new().to_string();
        let span = info_span!("annotation", operation = %operation, id = %id);
        self.run_inner(id, operation).instrument(span).await
    }

    async fn run_inner(&self, id: OperationId, operation: Operation) -> OperationReport {
        let clock = Instant::now();
        let mut report = OperationReport::new(id, operation);

        let mut progress = ProgressGuard::begin(
            Arc::clone(&self.notifier),
            &format!("{}: Processing..", APP_NAME),
        );
        let outcome = self.drive(operation, &mut report).await;
        progress.dismiss();

        match &outcome {
            OperationOutcome::Done => {
                info!(client = self.client.name(), "Annotation completed");
            }
            OperationOutcome::Failed(FailureReason::NoContent) => {
                info!("Nothing to annotate");
                self.notifier.notice(NO_CONTENT_NOTICE);
            }
            OperationOutcome::Failed(reason) => {
                error!(reason = reason.code(), error = %reason, "Annotation failed");
                self.notifier.error(&format!("{}: {}", APP_NAME, reason));
            }
        }

        report.outcome = outcome;
        report.duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        report
    }

    async fn drive(&self, operation: Operation, report: &mut OperationReport) -> OperationOutcome {
        report.enter(OperationStage::Extracting);
        let config = self.config.configuration();
        let extracted = match self.accessor.extract_content().await {
            Ok(Some(extracted)) => extracted,
            Ok(None) => return OperationOutcome::Failed(FailureReason::NoContent),
            Err(err) => return OperationOutcome::Failed(FailureReason::Unreadable(err)),
        };
        report.document_id = Some(extracted.document_id.clone());

        report.enter(OperationStage::Calling);
        let result = match self
            .client
            .generate(&config, operation.kind(), &extracted.raw_text)
            .await
        {
            Ok(result) => result,
            Err(err) => return OperationOutcome::Failed(FailureReason::Remote(err)),
        };
        report.result = Some(result.clone());

        report.enter(OperationStage::Mutating);
        match self.apply(operation, &config, &extracted, &result).await {
            Ok(()) => OperationOutcome::Done,
            Err(err) => OperationOutcome::Failed(FailureReason::Mutation(err)),
        }
    }

    async fn apply(
        &self,
        operation: Operation,
        config: &Configuration,
        extracted: &ExtractedDocument,
        result: &AnnotationResult,
    ) -> CoreResult<()> {
        let handle = self.accessor.resolve_target(&extracted.document_id)?;

        match (operation, result) {
            (Operation::TagAtTop { render }, AnnotationResult::TagList { tags }) => {
                self.accessor.insert_at_top(&handle, tags, render).await
            }
            (Operation::TagInMetadata, AnnotationResult::TagList { tags }) => {
                self.accessor
                    .merge_values_into_metadata_block(
                        &handle,
                        &config.metadata_property_name,
                        tags,
                    )
                    .await
            }
            (Operation::Proofread, AnnotationResult::CorrectedText { text }) => {
                self.accessor.replace_body(&handle, text).await
            }
            (operation, result) => Err(CoreError::Internal(format!(
                "{} cannot apply a {:?} result",
                operation,
                result.kind()
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::client::HttpAnnotationClient;
    use crate::document::{FileWorkspace, MemoryWorkspace};
    use crate::notify::{NoticeEvent, RecordingNotifier};
    use crate::settings::{AppSettings, MemoryConfigStore};
    use crate::testing::StubServer;
    use tempfile::TempDir;

    enum Reply {
        Tags(Vec<&'static str>),
        Text(&'static str),
        Status(u16),
    }

    type Hook = Box<dyn Fn() + Send + Sync>;

    struct ScriptedClient {
        reply: Reply,
        calls: AtomicUsize,
        texts: std::sync::Mutex<Vec<String>>,
        before_reply: Option<Hook>,
    }

    impl ScriptedClient {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                texts: std::sync::Mutex::new(Vec::new()),
                before_reply: None,
            }
        }

        fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
            self.before_reply = Some(Box::new(hook));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self, text: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts.lock().unwrap().push(text.to_string());
            if let Some(hook) = &self.before_reply {
                hook();
            }
        }
    }

    #[async_trait]
    impl AnnotationClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_tags(&self, _config: &Configuration, text: &str) -> CoreResult<Vec<String>> {
            self.record(text);
            match &self.reply {
                Reply::Tags(tags) => Ok(tags.iter().map(|t| t.to_string()).collect()),
                Reply::Text(_) => Err(CoreError::MalformedResponse("missing tags".into())),
                Reply::Status(status) => Err(CoreError::RemoteService {
                    status: *status,
                    body: String::new(),
                }),
            }
        }

        async fn proofread(&self, _config: &Configuration, text: &str) -> CoreResult<String> {
            self.record(text);
            match &self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Tags(_) => Err(CoreError::MalformedResponse("missing fixed_text".into())),
                Reply::Status(status) => Err(CoreError::RemoteService {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    struct Harness {
        workspace: Arc<MemoryWorkspace>,
        client: Arc<ScriptedClient>,
        notifier: Arc<RecordingNotifier>,
        orchestrator: AnnotationOrchestrator<Arc<MemoryWorkspace>>,
    }

    fn harness_with(
        workspace: Arc<MemoryWorkspace>,
        client: ScriptedClient,
        settings: AppSettings,
    ) -> Harness {
        let client = Arc::new(client);
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator = AnnotationOrchestrator::new(
            client.clone(),
            DocumentAccessor::new(Arc::clone(&workspace)),
            Arc::new(MemoryConfigStore::new(settings)),
            notifier.clone(),
        );
        Harness {
            workspace,
            client,
            notifier,
            orchestrator,
        }
    }

    fn harness(text: &str, reply: Reply) -> Harness {
        let workspace = Arc::new(MemoryWorkspace::new());
        workspace.open("note.md", text);
        harness_with(workspace, ScriptedClient::new(reply), AppSettings::default())
    }

    fn tag_at_top() -> Operation {
        Operation::TagAtTop {
            render: RenderKind::Tag,
        }
    }

    const ALL_STAGES: [OperationStage; 3] = [
        OperationStage::Extracting,
        OperationStage::Calling,
        OperationStage::Mutating,
    ];

    #[tokio::test]
    async fn test_tag_at_top_keeps_frontmatter_and_body() {
        let h = harness(
            "---\ntitle: Notes\n---\nMeeting notes...",
            Reply::Tags(vec!["work", "planning"]),
        );

        let report = h.orchestrator.run(tag_at_top()).await;

        assert!(report.is_done());
        assert_eq!(report.stages, ALL_STAGES);
        assert_eq!(report.document_id.as_deref(), Some("note.md"));
        assert_eq!(
            h.workspace.text("note.md").unwrap(),
            "---\ntitle: Notes\n---\n#work #planning\n\nMeeting notes..."
        );
        assert_eq!(h.client.texts.lock().unwrap()[0], "---\ntitle: Notes\n---\nMeeting notes...");
        assert!(h.notifier.open_progress().is_empty());
    }

    #[tokio::test]
    async fn test_tag_at_top_as_list() {
        let h = harness("Meeting notes...", Reply::Tags(vec!["work", "planning"]));

        let report = h
            .orchestrator
            .run(Operation::TagAtTop {
                render: RenderKind::List,
            })
            .await;

        assert!(report.is_done());
        assert_eq!(
            h.workspace.text("note.md").unwrap(),
            "- work\n- planning\n\nMeeting notes..."
        );
    }

    #[tokio::test]
    async fn test_empty_document_makes_no_network_call() {
        let h = harness("   \n", Reply::Tags(vec!["work"]));

        let report = h.orchestrator.run(tag_at_top()).await;

        assert!(matches!(
            report.outcome,
            OperationOutcome::Failed(FailureReason::NoContent)
        ));
        assert_eq!(report.stages, vec![OperationStage::Extracting]);
        assert_eq!(h.client.calls(), 0);
        assert!(h
            .notifier
            .events()
            .contains(&NoticeEvent::Notice(NO_CONTENT_NOTICE.to_string())));
        assert!(h.notifier.open_progress().is_empty());
    }

    #[tokio::test]
    async fn test_no_active_document_is_no_content() {
        let h = harness("Body", Reply::Tags(vec!["work"]));
        h.workspace.close();

        let report = h.orchestrator.run(Operation::TagInMetadata).await;

        assert!(matches!(
            report.outcome,
            OperationOutcome::Failed(FailureReason::NoContent)
        ));
        assert!(report.document_id.is_none());
        assert_eq!(h.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_leaves_document_untouched() {
        let h = harness("Meeting notes...", Reply::Status(500));

        let report = h.orchestrator.run(tag_at_top()).await;

        match &report.outcome {
            OperationOutcome::Failed(FailureReason::Remote(err)) => {
                assert_eq!(err.status(), Some(500))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            report.stages,
            vec![OperationStage::Extracting, OperationStage::Calling]
        );
        assert!(report.result.is_none());
        assert_eq!(h.workspace.text("note.md").unwrap(), "Meeting notes...");
        assert_eq!(h.workspace.document("note.md").unwrap().write_count(), 0);
        assert!(h.notifier.open_progress().is_empty());
        assert!(h
            .notifier
            .events()
            .iter()
            .any(|e| matches!(e, NoticeEvent::Error(msg) if msg.contains("HTTP 500"))));
    }

    #[tokio::test]
    async fn test_proofread_replaces_text() {
        let h = harness("Corected txt", Reply::Text("Corrected text."));

        let report = h.orchestrator.run(Operation::Proofread).await;

        assert!(report.is_done());
        assert_eq!(h.workspace.text("note.md").unwrap(), "Corrected text.");
        assert_eq!(
            report.result,
            Some(AnnotationResult::CorrectedText {
                text: "Corrected text.".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_tag_in_metadata_uses_configured_property() {
        let workspace = Arc::new(MemoryWorkspace::new());
        workspace.open("note.md", "---\ntitle: Notes\n---\nBody");
        let settings = AppSettings {
            metadata_property_name: "keywords".to_string(),
            ..AppSettings::default()
        };
        let h = harness_with(
            workspace,
            ScriptedClient::new(Reply::Tags(vec!["work", "planning"])),
            settings,
        );

        let report = h.orchestrator.run(Operation::TagInMetadata).await;

        assert!(report.is_done());
        assert_eq!(
            h.workspace.text("note.md").unwrap(),
            "---\ntitle: Notes\nkeywords:\n  - work\n  - planning\n---\nBody"
        );
        assert_eq!(h.workspace.document("note.md").unwrap().write_count(), 1);
    }

    #[tokio::test]
    async fn test_unmergeable_frontmatter_fails_without_partial_write() {
        let original = "---\ntags:\n  area: work\n---\nBody";
        let h = harness(original, Reply::Tags(vec!["a", "b"]));

        let report = h.orchestrator.run(Operation::TagInMetadata).await;

        assert!(matches!(
            report.outcome,
            OperationOutcome::Failed(FailureReason::Mutation(CoreError::MutationFailed(_)))
        ));
        assert_eq!(report.stages, ALL_STAGES);
        assert_eq!(h.workspace.text("note.md").unwrap(), original);
    }

    #[tokio::test]
    async fn test_document_closed_during_call_discards_result() {
        let workspace = Arc::new(MemoryWorkspace::new());
        workspace.open("note.md", "Body");
        let closer = Arc::clone(&workspace);
        let client = ScriptedClient::new(Reply::Text("Rewritten")).with_hook(move || closer.close());
        let h = harness_with(workspace, client, AppSettings::default());

        let report = h.orchestrator.run(Operation::Proofread).await;

        assert!(matches!(
            report.outcome,
            OperationOutcome::Failed(FailureReason::Mutation(CoreError::NoActiveDocument(_)))
        ));
        assert_eq!(h.workspace.text("note.md").unwrap(), "Body");
        assert!(h.notifier.open_progress().is_empty());
    }

    #[tokio::test]
    async fn test_switched_document_is_not_mutated() {
        let workspace = Arc::new(MemoryWorkspace::new());
        workspace.open("note.md", "Body");
        let switcher = Arc::clone(&workspace);
        let client = ScriptedClient::new(Reply::Tags(vec!["work"])).with_hook(move || {
            switcher.open("other.md", "Other");
        });
        let h = harness_with(workspace, client, AppSettings::default());

        let report = h.orchestrator.run(tag_at_top()).await;

        assert!(matches!(
            report.outcome,
            OperationOutcome::Failed(FailureReason::Mutation(CoreError::NoActiveDocument(_)))
        ));
        assert_eq!(h.workspace.text("note.md").unwrap(), "Body");
        assert_eq!(h.workspace.text("other.md").unwrap(), "Other");
    }

    #[tokio::test]
    async fn test_report_serializes_outcome() {
        let h = harness("Body", Reply::Status(503));
        let report = h.orchestrator.run(Operation::Proofread).await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["operation"]["type"], "proofread");
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["reason"], "remote");
        assert_eq!(json["outcome"]["httpStatus"], 503);
        assert_eq!(json["stages"], serde_json::json!(["extracting", "calling"]));
        assert!(json["id"].as_str().unwrap().len() == 26);

        let h = harness("Body", Reply::Tags(vec!["a"]));
        let report = h.orchestrator.run(tag_at_top()).await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], serde_json::json!({ "status": "done" }));
        assert_eq!(json["operation"]["render"], "tag");
        assert_eq!(json["result"]["type"], "tagList");
    }

    #[tokio::test]
    async fn test_overlapping_runs_both_complete() {
        let h = harness("Body", Reply::Tags(vec!["a"]));

        let (first, second) = tokio::join!(
            h.orchestrator.run(tag_at_top()),
            h.orchestrator.run(Operation::TagInMetadata)
        );

        assert!(first.is_done());
        assert!(second.is_done());
        assert_ne!(first.id, second.id);
        assert_eq!(h.client.calls(), 2);
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let server = StubServer::start(vec![(200, r#"{"tags":["work","planning"]}"#)]).await;
        let workspace = Arc::new(MemoryWorkspace::new());
        workspace.open("note.md", "Meeting notes...");
        let settings = AppSettings {
            service_url: server.base_url(),
            ..AppSettings::default()
        };
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator = AnnotationOrchestrator::new(
            Arc::new(HttpAnnotationClient::new().unwrap()),
            DocumentAccessor::new(Arc::clone(&workspace)),
            Arc::new(MemoryConfigStore::new(settings)),
            notifier.clone(),
        );

        let report = orchestrator.run(Operation::TagInMetadata).await;

        assert!(report.is_done());
        assert_eq!(
            workspace.text("note.md").unwrap(),
            "---\ntags:\n  - work\n  - planning\n---\nMeeting notes..."
        );
        assert_eq!(server.requests().len(), 1);
        assert!(notifier.open_progress().is_empty());
    }

    fn file_orchestrator(
        server_url: &str,
        workspace: FileWorkspace,
        notifier: Arc<RecordingNotifier>,
    ) -> AnnotationOrchestrator<FileWorkspace> {
        let settings = AppSettings {
            service_url: server_url.to_string(),
            ..AppSettings::default()
        };
        AnnotationOrchestrator::new(
            Arc::new(HttpAnnotationClient::new().unwrap()),
            DocumentAccessor::new(workspace),
            Arc::new(MemoryConfigStore::new(settings)),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_proofread_file_note_over_http() {
        let server = StubServer::start(vec![(200, r#"{"fixed_text":"Corrected text."}"#)]).await;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "Corected txt").unwrap();

        let workspace = FileWorkspace::new();
        workspace.open(&path).unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator = file_orchestrator(&server.base_url(), workspace, notifier.clone());

        let report = orchestrator.run(Operation::Proofread).await;

        assert!(report.is_done());
        assert_eq!(std::fs::read(&path).unwrap(), b"Corrected text.");
        assert_eq!(report.document_id.as_deref(), Some(&*path.to_string_lossy()));
        assert!(server.requests()[0]
            .head
            .starts_with("POST /documents/fix-text?text=Corected+txt HTTP/1.1"));
        assert!(notifier.open_progress().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_note_is_reported_as_read_failure() {
        let base_url = StubServer::unused_base_url().await;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        let bytes: &[u8] = &[0xff, 0xfe, b'a', 0x80];
        std::fs::write(&path, bytes).unwrap();

        let workspace = FileWorkspace::new();
        workspace.open(&path).unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator = file_orchestrator(&base_url, workspace, notifier.clone());

        let report = orchestrator.run(Operation::Proofread).await;

        assert!(matches!(
            report.outcome,
            OperationOutcome::Failed(FailureReason::Unreadable(CoreError::IoError(_)))
        ));
        assert_eq!(report.stages, vec![OperationStage::Extracting]);
        assert!(report.result.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), bytes);

        let events = notifier.events();
        assert!(!events.contains(&NoticeEvent::Notice(NO_CONTENT_NOTICE.to_string())));
        assert!(events
            .iter()
            .any(|e| matches!(e, NoticeEvent::Error(msg) if msg.contains("Cannot read note"))));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["reason"], "unreadable");
    }
}
