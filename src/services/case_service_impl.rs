//! `SeaORM` implementation of the `CaseService` trait.

use crate::db::Store;
use crate::domain::{CaseId, QueryId, UserStatus};
use crate::models::case::{Case, CaseFilter, FilterOptions, NewCase};
use crate::services::case_service::{CaseError, CaseRow, CaseService, ImportSummary};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::info;

pub struct SeaOrmCaseService {
    store: Store,
}

impl SeaOrmCaseService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CaseService for SeaOrmCaseService {
    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseRow>, CaseError> {
        let counties = self.store.query_counties().await?;
        let cases = self.store.list_cases().await?;

        Ok(filter
            .apply(cases, &counties)
            .into_iter()
            .map(|case| CaseRow {
                county: counties.get(&case.query_id).cloned(),
                case,
            })
            .collect())
    }

    async fn filter_options(&self) -> Result<FilterOptions, CaseError> {
        let counties = self.store.query_counties().await?;
        let cases = self.store.list_cases().await?;
        Ok(FilterOptions::collect(&cases, &counties))
    }

    async fn get_case(&self, id: &CaseId) -> Result<Case, CaseError> {
        self.store
            .get_case(id)
            .await?
            .ok_or_else(|| CaseError::NotFound(id.clone()))
    }

    async fn set_user_status(&self, id: &CaseId, status: UserStatus) -> Result<(), CaseError> {
        let rows = self.store.update_case_user_status(id, status).await?;
        if rows == 0 {
            return Err(CaseError::NotFound(id.clone()));
        }

        info!(case_id = %id, status = %status, "Case user status updated");
        Ok(())
    }

    async fn set_user_status_many(
        &self,
        ids: &[CaseId],
        status: UserStatus,
    ) -> Result<u64, CaseError> {
        if ids.is_empty() {
            return Err(CaseError::Validation("No cases selected".to_string()));
        }

        let mut seen = HashSet::new();
        let unique: Vec<CaseId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();

        let updated = self.store.update_case_user_statuses(&unique, status).await?;
        metrics::counter!("case_user_status_updates_total", "status" => status.as_str())
            .increment(updated);
        info!(count = updated, status = %status, "Bulk user status update applied");
        Ok(updated)
    }

    async fn import_cases(
        &self,
        query_id: &QueryId,
        cases: Vec<NewCase>,
    ) -> Result<ImportSummary, CaseError> {
        if self.store.get_query(query_id).await?.is_none() {
            return Err(CaseError::QueryNotFound(query_id.clone()));
        }

        let mut summary = ImportSummary::default();
        let mut batch = Vec::with_capacity(cases.len());

        for new_case in cases {
            let mut case = new_case.into_case(query_id.clone());
            case.validate()?;

            // Re-ingesting a case must not drop the user's tag.
            match self.store.get_case(&case.case_id).await? {
                Some(existing) => {
                    case.user_status = existing.user_status;
                    summary.updated += 1;
                }
                None if batch.iter().any(|c: &Case| c.case_id == case.case_id) => {
                    summary.updated += 1;
                }
                None => summary.created += 1,
            }
            batch.push(case);
        }

        self.store.upsert_cases(&batch).await?;

        metrics::counter!("cases_imported_total").increment(batch.len() as u64);
        info!(
            query_id = %query_id,
            created = summary.created,
            updated = summary.updated,
            "Imported workflow cases"
        );
        Ok(summary)
    }
}
