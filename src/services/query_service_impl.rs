//! `SeaORM` implementation of the `QueryService` trait.

use crate::db::Store;
use crate::domain::{QueryId, QueryStatus};
use crate::models::query::Query;
use crate::services::query_service::{QueryError, QueryService};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmQueryService {
    store: Store,
}

impl SeaOrmQueryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryService for SeaOrmQueryService {
    async fn list_queries(&self) -> Result<Vec<Query>, QueryError> {
        Ok(self.store.list_queries().await?)
    }

    async fn list_active_queries(&self) -> Result<Vec<Query>, QueryError> {
        Ok(self.store.list_active_queries().await?)
    }

    async fn get_query(&self, id: &QueryId) -> Result<Query, QueryError> {
        self.store
            .get_query(id)
            .await?
            .ok_or_else(|| QueryError::NotFound(id.clone()))
    }

    async fn advance_status(&self, id: &QueryId, next: QueryStatus) -> Result<Query, QueryError> {
        let mut query = self.get_query(id).await?;
        let from = query.status;

        if !from.can_transition_to(next) {
            return Err(QueryError::InvalidTransition { from, to: next });
        }

        if !self.store.set_query_status_if(id, from, next).await? {
            // Another writer moved it first; report against what is stored now.
            let current = self.get_query(id).await?.status;
            return Err(QueryError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        info!(query_id = %id, from = %from, to = %next, "Query status advanced");
        query.status = next;
        Ok(query)
    }
}
