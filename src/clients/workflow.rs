//! Hand-off of a submitted query to the external case-lookup workflow.
//!
//! The workflow runs out of process. Triggering it only starts the job and
//! yields an opaque tracking token; results arrive later through the case
//! ingestion endpoint and status callbacks.

use crate::domain::QueryId;
use crate::models::query::{Query, SearchQuery};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Opaque identifier of a started workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingToken(String);

impl TrackingToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TrackingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Workflow rejected the request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Workflow unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Workflow returned no tracking token")]
    EmptyToken,
}

#[async_trait::async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Starts the case-lookup job for `query`. Calling it twice for the same
    /// query id must not start a second job.
    async fn trigger(&self, query: &Query) -> Result<TrackingToken, TriggerError>;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerPayload<'a> {
    county: &'a str,
    searches: &'a [SearchQuery],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerResponse {
    #[serde(alias = "executionArn", default)]
    tracking_token: Option<String>,
}

/// Starts the workflow with a JSON POST to a configured endpoint.
#[derive(Clone)]
pub struct HttpWorkflowTrigger {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpWorkflowTrigger {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("casedesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[async_trait::async_trait]
impl WorkflowTrigger for HttpWorkflowTrigger {
    async fn trigger(&self, query: &Query) -> Result<TrackingToken, TriggerError> {
        let payload = TriggerPayload {
            county: &query.county,
            searches: &query.searches,
        };

        debug!(
            query_id = %query.id,
            searches = query.searches.len(),
            "Triggering case workflow"
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Idempotency-Key", query.id.as_str())
            .json(&payload);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriggerError::Rejected { status, body });
        }

        let body: TriggerResponse = response.json().await?;
        let token = body
            .tracking_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(TriggerError::EmptyToken)?;

        info!(query_id = %query.id, token = %token, "Case workflow started");
        Ok(TrackingToken(token))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Offline trigger that starts nothing and derives the token from the
/// query id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWorkflowTrigger;

impl LocalWorkflowTrigger {
    #[must_use]
    pub fn token_for(id: &QueryId) -> TrackingToken {
        TrackingToken(format!("local:case-processing:{id}"))
    }
}

#[async_trait::async_trait]
impl WorkflowTrigger for LocalWorkflowTrigger {
    async fn trigger(&self, query: &Query) -> Result<TrackingToken, TriggerError> {
        Ok(Self::token_for(&query.id))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
