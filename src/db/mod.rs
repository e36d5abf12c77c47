use crate::domain::{CaseId, QueryId, QueryStatus, UserStatus};
use crate::models::case::Case;
use crate::models::query::Query;
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Referential failures the store reports inside `anyhow::Error`. Callers
/// that care recover them with `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Query not found: {0}")]
    UnknownQuery(QueryId),

    #[error("Case not found: {0}")]
    UnknownCase(CaseId),
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    /// Connects and brings the schema up to date. Running it against an
    /// existing database is a no-op apart from the connection.
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite:")
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn query_repo(&self) -> repositories::query::QueryRepository {
        repositories::query::QueryRepository::new(self.conn.clone())
    }

    fn case_repo(&self) -> repositories::case::CaseRepository {
        repositories::case::CaseRepository::new(self.conn.clone())
    }

    // ========== Queries ==========

    pub async fn upsert_query(&self, query: &Query) -> Result<()> {
        self.query_repo().upsert(query).await
    }

    pub async fn get_query(&self, id: &QueryId) -> Result<Option<Query>> {
        self.query_repo().get(id).await
    }

    /// All queries, oldest first.
    pub async fn list_queries(&self) -> Result<Vec<Query>> {
        self.query_repo().list_all().await
    }

    pub async fn list_active_queries(&self) -> Result<Vec<Query>> {
        let mut queries = self.list_queries().await?;
        queries.retain(|q| q.status.is_active());
        Ok(queries)
    }

    pub async fn query_counties(&self) -> Result<HashMap<QueryId, String>> {
        Ok(self.query_repo().counties().await?.into_iter().collect())
    }

    /// Moves a query from `current` to `next`. Returns `false` when the
    /// stored status no longer equals `current`.
    pub async fn set_query_status_if(
        &self,
        id: &QueryId,
        current: QueryStatus,
        next: QueryStatus,
    ) -> Result<bool> {
        let rows = self
            .query_repo()
            .compare_and_set_status(id, current, next)
            .await?;
        Ok(rows > 0)
    }

    // ========== Cases ==========

    /// Insert-or-overwrite by case id. Fails with
    /// [`StoreError::UnknownQuery`] when the producing query is absent.
    pub async fn upsert_case(&self, case: &Case) -> Result<()> {
        if !self.query_repo().exists(&case.query_id).await? {
            return Err(StoreError::UnknownQuery(case.query_id.clone()).into());
        }
        self.case_repo().upsert(case).await
    }

    /// Upserts a batch atomically after checking every referenced query.
    pub async fn upsert_cases(&self, cases: &[Case]) -> Result<()> {
        let query_ids: BTreeSet<&QueryId> = cases.iter().map(|c| &c.query_id).collect();
        let queries = self.query_repo();
        for id in query_ids {
            if !queries.exists(id).await? {
                return Err(StoreError::UnknownQuery(id.clone()).into());
            }
        }
        self.case_repo().upsert_many(cases).await
    }

    pub async fn get_case(&self, id: &CaseId) -> Result<Option<Case>> {
        self.case_repo().get(id).await
    }

    /// All cases ordered by load date, then case id.
    pub async fn list_cases(&self) -> Result<Vec<Case>> {
        self.case_repo().list_all().await
    }

    pub async fn count_cases(&self) -> Result<u64> {
        self.case_repo().count().await
    }

    /// Returns rows affected; `0` means the case does not exist.
    pub async fn update_case_user_status(&self, id: &CaseId, status: UserStatus) -> Result<u64> {
        self.case_repo().update_user_status(id, status).await
    }

    /// All-or-nothing variant of [`Self::update_case_user_status`].
    pub async fn update_case_user_statuses(
        &self,
        ids: &[CaseId],
        status: UserStatus,
    ) -> Result<u64> {
        self.case_repo().update_user_status_many(ids, status).await
    }
}
