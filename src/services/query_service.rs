//! Domain service for submitted queries and their workflow status.

use crate::domain::{QueryId, QueryStatus};
use crate::models::query::Query;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query not found: {0}")]
    NotFound(QueryId),

    #[error("Cannot move query from {from} to {to}")]
    InvalidTransition { from: QueryStatus, to: QueryStatus },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for QueryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait QueryService: Send + Sync {
    /// All queries, oldest first.
    async fn list_queries(&self) -> Result<Vec<Query>, QueryError>;

    /// Queries still waiting on the workflow.
    async fn list_active_queries(&self) -> Result<Vec<Query>, QueryError>;

    async fn get_query(&self, id: &QueryId) -> Result<Query, QueryError>;

    /// Moves a query forward to `next`. Backward moves, repeats and moves
    /// out of a terminal status fail with `InvalidTransition`.
    async fn advance_status(&self, id: &QueryId, next: QueryStatus) -> Result<Query, QueryError>;
}
