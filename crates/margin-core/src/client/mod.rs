//! Remote Annotation Client
//!
//! Stateless mapping between raw note text plus a [`Configuration`] and the
//! annotation service's wire contract.
//!
//! ## Endpoints
//!
//! | Endpoint              | Query  | Body      | Success field          |
//! |-----------------------|--------|-----------|------------------------|
//! | `/documents/tags`     | `text` | `{model}` | `tags: [string]`       |
//! | `/documents/fix-text` | `text` | `{model}` | `fixed_text: string`   |
//!
//! One network attempt per call: no retry, no caching, no partial results.

mod http;

pub use http::HttpAnnotationClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::settings::Configuration;
use crate::types::{AnnotationKind, AnnotationResult};

// =============================================================================
// Client Trait
// =============================================================================

/// Trait for annotation service clients
#[async_trait]
pub trait AnnotationClient: Send + Sync {
    /// Returns the client name
    fn name(&self) -> &str;

    /// Generates tags for the text, in service order
    async fn fetch_tags(&self, config: &Configuration, text: &str) -> CoreResult<Vec<String>>;

    /// Returns a corrected version of the text
    async fn proofread(&self, config: &Configuration, text: &str) -> CoreResult<String>;

    /// Runs the request for `kind` and wraps the answer in the matching variant
    async fn generate(
        &self,
        config: &Configuration,
        kind: AnnotationKind,
        text: &str,
    ) -> CoreResult<AnnotationResult> {
        match kind {
            AnnotationKind::Tags => {
                let tags = self.fetch_tags(config, text).await?;
                Ok(AnnotationResult::TagList { tags })
            }
            AnnotationKind::Proofread => {
                let text = self.proofread(config, text).await?;
                Ok(AnnotationResult::CorrectedText { text })
            }
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// JSON body sent to both endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRequestBody<'a> {
    pub model: &'a str,
}

#[derive(Deserialize)]
struct TagsResponse {
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct FixTextResponse {
    fixed_text: String,
}

// =============================================================================
// Response Interpretation
// =============================================================================

/// Maps a non-success status to [`CoreError::RemoteService`]
pub fn check_status(status: u16, body: &str) -> CoreResult<()> {
    if status >= 400 {
        return Err(CoreError::RemoteService {
            status,
            body: truncate_body(body),
        });
    }
    Ok(())
}

/// Interprets a `/documents/tags` response
pub fn parse_tags_response(status: u16, body: &str) -> CoreResult<Vec<String>> {
    check_status(status, body)?;
    let parsed: TagsResponse = serde_json::from_str(body).map_err(|e| {
        CoreError::MalformedResponse(format!("expected {{\"tags\": [string]}}: {}", e))
    })?;
    Ok(parsed.tags)
}

/// Interprets a `/documents/fix-text` response
pub fn parse_fixed_text_response(status: u16, body: &str) -> CoreResult<String> {
    check_status(status, body)?;
    let parsed: FixTextResponse = serde_json::from_str(body).map_err(|e| {
        CoreError::MalformedResponse(format!("expected {{\"fixed_text\": string}}: {}", e))
    })?;
    Ok(parsed.fixed_text)
}

/// Keeps error bodies short enough for logs
fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 512;
    if body.chars().count() <= MAX_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_CHARS).collect();
    truncated.push('…');
    truncated
}
