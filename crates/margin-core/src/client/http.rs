//! HTTP Annotation Client
//!
//! Implements the AnnotationClient trait over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use super::{parse_fixed_text_response, parse_tags_response, AnnotationClient, ServiceRequestBody};
use crate::error::{CoreError, CoreResult};
use crate::settings::Configuration;
use crate::types::AnnotationKind;

/// Annotation client that talks to the remote service over HTTP
pub struct HttpAnnotationClient {
    client: reqwest::Client,
}

impl HttpAnnotationClient {
    /// Creates a new HTTP client
    pub fn new() -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("margin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Builds the request for `kind` without sending it.
    ///
    /// The base URL is validated here; a malformed URL never reaches the network.
    pub fn build_request(
        &self,
        config: &Configuration,
        kind: AnnotationKind,
        text: &str,
    ) -> CoreResult<reqwest::Request> {
        let mut url = config.endpoint(kind)?;
        url.query_pairs_mut().append_pair("text", text);

        let mut builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .json(&ServiceRequestBody {
                model: &config.model,
            });

        if let Some(api_key) = config.api_key() {
            builder = builder.bearer_auth(api_key);
        }

        builder
            .build()
            .map_err(|e| CoreError::InvalidServiceUrl(e.without_url().to_string()))
    }

    /// Sends one request and returns the raw status and body
    async fn execute(
        &self,
        config: &Configuration,
        kind: AnnotationKind,
        text: &str,
    ) -> CoreResult<(u16, String)> {
        let request = self.build_request(config, kind, text)?;
        debug!(
            endpoint = kind.endpoint_path(),
            model = %config.model,
            text_len = text.len(),
            "Sending annotation request"
        );

        let response = self.client.execute(request).await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!(
                    "timed out after {}s",
                    config.request_timeout_secs.max(1)
                )
            } else {
                e.without_url().to_string()
            };
            CoreError::RequestFailed(format!(
                "{} {}: {}",
                config.service_base_url,
                kind.endpoint_path(),
                reason
            ))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            CoreError::RequestFailed(format!("Failed to read response: {}", e.without_url()))
        })?;

        debug!(status, body_len = body.len(), "Annotation service responded");
        Ok((status, body))
    }
}

#[async_trait]
impl AnnotationClient for HttpAnnotationClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_tags(&self, config: &Configuration, text: &str) -> CoreResult<Vec<String>> {
        let (status, body) = self.execute(config, AnnotationKind::Tags, text).await?;
        parse_tags_response(status, &body)
    }

    async fn proofread(&self, config: &Configuration, text: &str) -> CoreResult<String> {
        let (status, body) = self.execute(config, AnnotationKind::Proofread, text).await?;
        parse_fixed_text_response(status, &body)
    }
}

// =============================================================================
// Tests
// =============================================================================
