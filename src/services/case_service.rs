//! Domain service for reviewing and tagging cases.

use crate::domain::{CaseId, QueryId, UserStatus};
use crate::models::case::{Case, CaseFilter, FilterOptions, NewCase};
use serde::Serialize;
use thiserror::Error;

/// A case together with the county of the query that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRow {
    #[serde(flatten)]
    pub case: Case,
    pub county: Option<String>,
}

/// Outcome of loading a batch of workflow results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Case not found: {0}")]
    NotFound(CaseId),

    #[error("Query not found: {0}")]
    QueryNotFound(QueryId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CaseError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CaseError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<crate::db::StoreError>() {
            Some(crate::db::StoreError::UnknownCase(id)) => Self::NotFound(id.clone()),
            Some(crate::db::StoreError::UnknownQuery(id)) => Self::QueryNotFound(id.clone()),
            None => Self::Internal(err.to_string()),
        }
    }
}

impl From<crate::models::ValidationError> for CaseError {
    fn from(err: crate::models::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait CaseService: Send + Sync {
    /// Lists cases matching `filter`, ordered by load date then case id.
    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseRow>, CaseError>;

    /// Distinct values for the filter selectors.
    async fn filter_options(&self) -> Result<FilterOptions, CaseError>;

    async fn get_case(&self, id: &CaseId) -> Result<Case, CaseError>;

    /// Sets the user status of a single case.
    async fn set_user_status(&self, id: &CaseId, status: UserStatus) -> Result<(), CaseError>;

    /// Sets the user status of every listed case, or of none when any id
    /// is unknown.
    async fn set_user_status_many(
        &self,
        ids: &[CaseId],
        status: UserStatus,
    ) -> Result<u64, CaseError>;

    /// Upserts workflow results for an existing query.
    async fn import_cases(
        &self,
        query_id: &QueryId,
        cases: Vec<NewCase>,
    ) -> Result<ImportSummary, CaseError>;
}
