use crate::db::StoreError;
use crate::domain::{CaseId, QueryId, UserStatus};
use crate::entities::{cases, prelude::*};
use crate::models::case::Case;
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

pub struct CaseRepository {
    conn: DatabaseConnection,
}

impl CaseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model_to_case(model: cases::Model) -> Result<Case> {
        let user_status = model
            .user_status
            .as_deref()
            .map(str::parse::<UserStatus>)
            .transpose()
            .with_context(|| format!("Corrupt user_status for case {}", model.case_id))?;

        Ok(Case {
            filing_date: model
                .filing_date
                .parse()
                .with_context(|| format!("Corrupt filing_date for case {}", model.case_id))?,
            loaded: model
                .loaded
                .parse()
                .with_context(|| format!("Corrupt loaded date for case {}", model.case_id))?,
            addresses: serde_json::from_str(&model.addresses)
                .with_context(|| format!("Corrupt addresses for case {}", model.case_id))?,
            other: serde_json::from_str(&model.other)
                .with_context(|| format!("Corrupt other for case {}", model.case_id))?,
            case_id: CaseId::from(model.case_id),
            business: model.business,
            defendant: model.defendant,
            case_name: model.case_name,
            case_status: model.case_status,
            query_id: QueryId::from(model.query_id),
            user_status,
        })
    }

    fn to_active_model(case: &Case) -> Result<cases::ActiveModel> {
        Ok(cases::ActiveModel {
            case_id: Set(case.case_id.to_string()),
            business: Set(case.business.clone()),
            filing_date: Set(case.filing_date.to_string()),
            defendant: Set(case.defendant.clone()),
            case_name: Set(case.case_name.clone()),
            loaded: Set(case.loaded.to_string()),
            case_status: Set(case.case_status.clone()),
            addresses: Set(serde_json::to_string(&case.addresses)?),
            other: Set(serde_json::to_string(&case.other)?),
            query_id: Set(case.query_id.to_string()),
            user_status: Set(case.user_status.map(|s| s.as_str().to_string())),
        })
    }

    async fn upsert_with<C: ConnectionTrait>(conn: &C, case: &Case) -> Result<()> {
        Cases::insert(Self::to_active_model(case)?)
            .on_conflict(
                OnConflict::column(cases::Column::CaseId)
                    .update_columns([
                        cases::Column::Business,
                        cases::Column::FilingDate,
                        cases::Column::Defendant,
                        cases::Column::CaseName,
                        cases::Column::Loaded,
                        cases::Column::CaseStatus,
                        cases::Column::Addresses,
                        cases::Column::Other,
                        cases::Column::QueryId,
                        cases::Column::UserStatus,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Insert-or-overwrite by `case_id`. The caller checks that the
    /// referenced query exists; the schema's foreign key backs it up.
    pub async fn upsert(&self, case: &Case) -> Result<()> {
        Self::upsert_with(&self.conn, case).await
    }

    /// Upserts a batch in one transaction.
    pub async fn upsert_many(&self, cases: &[Case]) -> Result<()> {
        let txn = self.conn.begin().await?;
        for case in cases {
            Self::upsert_with(&txn, case).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &CaseId) -> Result<Option<Case>> {
        Cases::find_by_id(id.as_str())
            .one(&self.conn)
            .await?
            .map(Self::map_model_to_case)
            .transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Case>> {
        Cases::find()
            .order_by_asc(cases::Column::Loaded)
            .order_by_asc(cases::Column::CaseId)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Self::map_model_to_case)
            .collect()
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Cases::find().count(&self.conn).await?)
    }

    /// Sets `user_status` on one case. Returns rows affected, so `0` means
    /// no such case.
    pub async fn update_user_status(&self, id: &CaseId, status: UserStatus) -> Result<u64> {
        let result = Cases::update_many()
            .col_expr(cases::Column::UserStatus, Expr::value(status.as_str()))
            .filter(cases::Column::CaseId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Sets `user_status` on every listed case, or on none of them. An
    /// unknown id rolls the transaction back and fails with
    /// [`StoreError::UnknownCase`].
    pub async fn update_user_status_many(&self, ids: &[CaseId], status: UserStatus) -> Result<u64> {
        let txn = self.conn.begin().await?;
        let mut updated = 0;

        for id in ids {
            let result = Cases::update_many()
                .col_expr(cases::Column::UserStatus, Expr::value(status.as_str()))
                .filter(cases::Column::CaseId.eq(id.as_str()))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await?;
                return Err(StoreError::UnknownCase(id.clone()).into());
            }
            updated += result.rows_affected;
        }

        txn.commit().await?;
        Ok(updated)
    }
}
