use crate::domain::{QueryId, QueryStatus};
use crate::entities::{prelude::*, queries};
use crate::models::query::{Query, SearchQuery};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Expr, OnConflict},
};

pub struct QueryRepository {
    conn: DatabaseConnection,
}

impl QueryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model_to_query(model: queries::Model) -> Result<Query> {
        let searches: Vec<SearchQuery> = serde_json::from_str(&model.searches)
            .with_context(|| format!("Corrupt searches column for query {}", model.id))?;
        let timestamp = DateTime::parse_from_rfc3339(&model.timestamp)
            .with_context(|| format!("Corrupt timestamp for query {}", model.id))?
            .with_timezone(&Utc);
        let status = model
            .status
            .parse::<QueryStatus>()
            .with_context(|| format!("Corrupt status for query {}", model.id))?;

        Ok(Query {
            id: QueryId::from(model.id),
            county: model.county,
            searches,
            timestamp,
            status,
            tracking_token: model.tracking_token,
        })
    }

    pub async fn upsert(&self, query: &Query) -> Result<()> {
        let active_model = queries::ActiveModel {
            id: Set(query.id.to_string()),
            county: Set(query.county.clone()),
            searches: Set(serde_json::to_string(&query.searches)?),
            // Fixed-width so text order matches time order.
            timestamp: Set(query
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Nanos, true)),
            status: Set(query.status.as_str().to_string()),
            tracking_token: Set(query.tracking_token.clone()),
        };

        Queries::insert(active_model)
            .on_conflict(
                OnConflict::column(queries::Column::Id)
                    .update_columns([
                        queries::Column::County,
                        queries::Column::Searches,
                        queries::Column::Timestamp,
                        queries::Column::Status,
                        queries::Column::TrackingToken,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: &QueryId) -> Result<Option<Query>> {
        Queries::find_by_id(id.as_str())
            .one(&self.conn)
            .await?
            .map(Self::map_model_to_query)
            .transpose()
    }

    pub async fn exists(&self, id: &QueryId) -> Result<bool> {
        Ok(Queries::find_by_id(id.as_str())
            .one(&self.conn)
            .await?
            .is_some())
    }

    pub async fn list_all(&self) -> Result<Vec<Query>> {
        Queries::find()
            .order_by_asc(queries::Column::Timestamp)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Self::map_model_to_query)
            .collect()
    }

    /// Query id to county, for resolving the county of each case.
    pub async fn counties(&self) -> Result<Vec<(QueryId, String)>> {
        let rows = Queries::find().all(&self.conn).await?;
        Ok(rows
            .into_iter()
            .map(|q| (QueryId::from(q.id), q.county))
            .collect())
    }

    /// Writes `next` only while the stored status is still `current`, so a
    /// concurrent writer cannot move the status backwards. Returns rows
    /// affected.
    pub async fn compare_and_set_status(
        &self,
        id: &QueryId,
        current: QueryStatus,
        next: QueryStatus,
    ) -> Result<u64> {
        let result = Queries::update_many()
            .col_expr(queries::Column::Status, Expr::value(next.as_str()))
            .filter(queries::Column::Id.eq(id.as_str()))
            .filter(queries::Column::Status.eq(current.as_str()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
