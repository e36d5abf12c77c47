use crate::clients::workflow::WorkflowTrigger;
use crate::db::Store;
use crate::domain::{CaseId, QueryId};
use crate::models::ValidationError;
use crate::models::case::Case;
use crate::models::draft::SubmissionDraft;
use crate::models::query::{Query, SearchQuery};
use crate::services::submission_service::{SubmissionService, SubmitError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct DefaultSubmissionService {
    store: Store,
    trigger: Arc<dyn WorkflowTrigger>,
}

impl DefaultSubmissionService {
    #[must_use]
    pub fn new(store: Store, trigger: Arc<dyn WorkflowTrigger>) -> Self {
        Self { store, trigger }
    }
}

#[async_trait]
impl SubmissionService for DefaultSubmissionService {
    async fn submit(&self, draft: &SubmissionDraft) -> Result<Query, SubmitError> {
        let query = draft.to_query()?;
        self.submit_query(query).await
    }

    async fn submit_query(&self, mut query: Query) -> Result<Query, SubmitError> {
        query.validate()?;

        let token = match self.trigger.trigger(&query).await {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    query_id = %query.id,
                    trigger = self.trigger.name(),
                    error = %e,
                    "Workflow trigger failed, query not saved"
                );
                metrics::counter!("query_submissions_total", "outcome" => "trigger_failed")
                    .increment(1);
                return Err(e.into());
            }
        };

        query.mark_submitted(token.into_inner());

        if let Err(e) = self.store.upsert_query(&query).await {
            error!(
                query_id = %query.id,
                error = %e,
                "Workflow started but the query could not be saved"
            );
            metrics::counter!("query_submissions_total", "outcome" => "store_failed")
                .increment(1);
            return Err(SubmitError::Database(e.to_string()));
        }

        metrics::counter!("query_submissions_total", "outcome" => "submitted").increment(1);
        info!(
            query_id = %query.id,
            county = %query.county,
            searches = query.searches.len(),
            "Query submitted"
        );
        Ok(query)
    }

    async fn reload_cases(&self, ids: &[CaseId]) -> Result<Vec<Query>, SubmitError> {
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let case = self
                .store
                .get_case(id)
                .await?
                .ok_or_else(|| SubmitError::CaseNotFound(id.clone()))?;
            selected.push(case);
        }

        let counties = self.store.query_counties().await?;
        let queries = plan_reload(&selected, &counties)?;

        let mut submitted = Vec::with_capacity(queries.len());
        for query in queries {
            submitted.push(self.submit_query(query).await?);
        }
        Ok(submitted)
    }
}

/// Groups `cases` by the county of their producing query, then by business,
/// and builds one pending query per county.
pub(crate) fn plan_reload(
    cases: &[Case],
    counties: &HashMap<QueryId, String>,
) -> Result<Vec<Query>, ValidationError> {
    if cases.is_empty() {
        return Err(ValidationError::NoSearches);
    }

    let mut plan: BTreeMap<&str, BTreeMap<&str, (NaiveDate, NaiveDate)>> = BTreeMap::new();
    for case in cases {
        let county = counties
            .get(&case.query_id)
            .map(String::as_str)
            .ok_or(ValidationError::Blank("county"))?;
        plan.entry(county)
            .or_default()
            .entry(case.business.as_str())
            .and_modify(|(start, end)| {
                *start = (*start).min(case.filing_date);
                *end = (*end).max(case.filing_date);
            })
            .or_insert((case.filing_date, case.filing_date));
    }

    plan.into_iter()
        .map(|(county, businesses)| {
            let searches = businesses
                .into_iter()
                .map(|(business, (start, end))| SearchQuery::new(business, start, end))
                .collect::<Result<Vec<_>, _>>()?;
            Query::new(county, searches)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, business: &str, query: &str, filed: &str) -> Case {
        Case {
            case_id: CaseId::from(id),
            business: business.to_string(),
            filing_date: filed.parse().unwrap(),
            defendant: "Someone".to_string(),
            case_name: None,
            loaded: "2024-03-01".parse().unwrap(),
            case_status: "Active".to_string(),
            addresses: vec![],
            other: serde_json::Map::new(),
            query_id: QueryId::from(query),
            user_status: None,
        }
    }

    #[test]
    fn reload_groups_by_county_and_spans_filing_dates() {
        let counties = HashMap::from([
            (QueryId::from("q1"), "Travis".to_string()),
            (QueryId::from("q2"), "Harris".to_string()),
        ]);
        let cases = vec![
            case("C1", "Acme", "q1", "2024-01-10"),
            case("C2", "Acme", "q1", "2024-02-20"),
            case("C3", "Globex", "q1", "2024-01-05"),
            case("C4", "Acme", "q2", "2024-03-01"),
        ];

        let queries = plan_reload(&cases, &counties).unwrap();
        assert_eq!(queries.len(), 2);

        let harris = &queries[0];
        assert_eq!(harris.county, "Harris");
        assert_eq!(harris.searches.len(), 1);

        let travis = &queries[1];
        assert_eq!(travis.county, "Travis");
        let acme = &travis.searches[0];
        assert_eq!(acme.business, "Acme");
        assert_eq!(acme.start_date.to_string(), "2024-01-10");
        assert_eq!(acme.end_date.to_string(), "2024-02-20");
        assert_eq!(travis.searches[1].business, "Globex");
    }

    #[test]
    fn reload_without_cases_is_rejected() {
        assert_eq!(
            plan_reload(&[], &HashMap::new()).unwrap_err(),
            ValidationError::NoSearches
        );
    }
}
