//! Submitting queries to the case-lookup workflow.
//!
//! A query is only persisted after the workflow accepted it, so a failed
//! trigger leaves no trace in the store.

use crate::clients::workflow::TriggerError;
use crate::domain::CaseId;
use crate::models::ValidationError;
use crate::models::draft::SubmissionDraft;
use crate::models::query::Query;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to submit query: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SubmitError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SubmitError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait SubmissionService: Send + Sync {
    /// Builds a query from `draft`, triggers the workflow and persists the
    /// query as `submitted`. The draft is not modified.
    async fn submit(&self, draft: &SubmissionDraft) -> Result<Query, SubmitError>;

    /// Triggers and persists an already-built pending query.
    async fn submit_query(&self, query: Query) -> Result<Query, SubmitError>;

    /// Re-submits the given cases: one query per county, with one search
    /// per business spanning the filing dates of its selected cases.
    async fn reload_cases(&self, ids: &[CaseId]) -> Result<Vec<Query>, SubmitError>;
}
