use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ValidationError, require_text};
use crate::domain::{QueryId, QueryStatus};

/// One business name searched over a filing-date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub business: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SearchQuery {
    pub fn new(
        business: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let search = Self {
            business: business.into().trim().to_string(),
            start_date,
            end_date,
        };
        search.validate()?;
        Ok(search)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("business", &self.business)?;
        if self.start_date > self.end_date {
            return Err(ValidationError::InvertedRange {
                start: self.start_date.to_string(),
                end: self.end_date.to_string(),
            });
        }
        Ok(())
    }
}

/// A county-wide request for one or more business searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: QueryId,
    pub county: String,
    pub searches: Vec<SearchQuery>,
    pub timestamp: DateTime<Utc>,
    pub status: QueryStatus,
    pub tracking_token: Option<String>,
}

impl Query {
    /// Builds a fresh pending query with a new id.
    pub fn new(
        county: impl Into<String>,
        searches: Vec<SearchQuery>,
    ) -> Result<Self, ValidationError> {
        let query = Self {
            id: QueryId::generate(),
            county: county.into().trim().to_string(),
            searches,
            timestamp: Utc::now(),
            status: QueryStatus::Pending,
            tracking_token: None,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("county", &self.county)?;
        if self.searches.is_empty() {
            return Err(ValidationError::NoSearches);
        }
        self.searches.iter().try_for_each(SearchQuery::validate)
    }

    /// Records a successful hand-off to the workflow.
    pub fn mark_submitted(&mut self, tracking_token: String) {
        self.tracking_token = Some(tracking_token);
        self.status = QueryStatus::Submitted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn search_query_rejects_blank_business() {
        let err = SearchQuery::new("   ", date("2024-01-01"), date("2024-02-01")).unwrap_err();
        assert_eq!(err, ValidationError::Blank("business"));
    }

    #[test]
    fn search_query_rejects_inverted_range() {
        let err = SearchQuery::new("Acme", date("2024-03-01"), date("2024-02-01")).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedRange { .. }));
    }

    #[test]
    fn search_query_serializes_camel_case_dates() {
        let search = SearchQuery::new("Acme", date("2024-01-01"), date("2024-01-31")).unwrap();
        let json = serde_json::to_value(&search).unwrap();
        assert_eq!(json["business"], "Acme");
        assert_eq!(json["startDate"], "2024-01-01");
        assert_eq!(json["endDate"], "2024-01-31");
    }

    #[test]
    fn new_query_is_pending_without_token() {
        let search = SearchQuery::new("Acme", date("2024-01-01"), date("2024-01-31")).unwrap();
        let query = Query::new(" Travis ", vec![search]).unwrap();
        assert_eq!(query.county, "Travis");
        assert_eq!(query.status, QueryStatus::Pending);
        assert!(query.tracking_token.is_none());
    }

    #[test]
    fn query_requires_county_and_searches() {
        let search = SearchQuery::new("Acme", date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(
            Query::new("", vec![search]).unwrap_err(),
            ValidationError::Blank("county")
        );
        assert_eq!(
            Query::new("Travis", vec![]).unwrap_err(),
            ValidationError::NoSearches
        );
    }

    #[test]
    fn mark_submitted_sets_token_and_status() {
        let search = SearchQuery::new("Acme", date("2024-01-01"), date("2024-01-31")).unwrap();
        let mut query = Query::new("Travis", vec![search]).unwrap();
        query.mark_submitted("token-1".to_string());
        assert_eq!(query.status, QueryStatus::Submitted);
        assert_eq!(query.tracking_token.as_deref(), Some("token-1"));
    }
}
