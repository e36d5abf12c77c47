use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::{ValidationError, require_text};
use crate::domain::{CaseId, QueryId, UserStatus};

/// A court case returned by the lookup workflow for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub case_id: CaseId,
    pub business: String,
    pub filing_date: NaiveDate,
    pub defendant: String,
    #[serde(default)]
    pub case_name: Option<String>,
    #[serde(default = "today")]
    pub loaded: NaiveDate,
    pub case_status: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Source attributes with no dedicated column.
    #[serde(default)]
    pub other: serde_json::Map<String, serde_json::Value>,
    pub query_id: QueryId,
    #[serde(default)]
    pub user_status: Option<UserStatus>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Case {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("caseId", self.case_id.as_str())?;
        require_text("business", &self.business)?;
        require_text("defendant", &self.defendant)?;
        require_text("queryId", self.query_id.as_str())
    }
}

/// A case as delivered by the lookup workflow, before it is tied to the
/// query that produced it. Unrecognised keys are kept in `other`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub case_id: CaseId,
    pub business: String,
    pub filing_date: NaiveDate,
    pub defendant: String,
    #[serde(default)]
    pub case_name: Option<String>,
    #[serde(default)]
    pub loaded: Option<NaiveDate>,
    pub case_status: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub other: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl NewCase {
    /// Binds the case to `query_id`. The user status starts unset.
    #[must_use]
    pub fn into_case(self, query_id: QueryId) -> Case {
        let mut other = self.other;
        for (key, value) in self.extra {
            if key != "queryId" && key != "userStatus" {
                other.entry(key).or_insert(value);
            }
        }

        Case {
            case_id: CaseId::from(self.case_id.as_str().trim()),
            business: self.business.trim().to_string(),
            filing_date: self.filing_date,
            defendant: self.defendant.trim().to_string(),
            case_name: self.case_name.filter(|name| !name.trim().is_empty()),
            loaded: self.loaded.unwrap_or_else(today),
            case_status: self.case_status.trim().to_string(),
            addresses: self.addresses,
            other,
            query_id,
            user_status: None,
        }
    }
}

/// Matching rule for the `userStatus` filter. `Unset` selects cases the
/// user has not tagged yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatusFilter {
    Unset,
    Is(UserStatus),
}

impl std::str::FromStr for UserStatusFilter {
    type Err = crate::domain::ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") {
            Ok(Self::Unset)
        } else {
            s.parse().map(Self::Is)
        }
    }
}

/// Case view filters. `None` on a field means "All".
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub business: Option<String>,
    pub county: Option<String>,
    pub case_status: Option<String>,
    pub user_status: Option<UserStatusFilter>,
}

impl CaseFilter {
    /// `county` is the county of the query that produced the case.
    #[must_use]
    pub fn matches(&self, case: &Case, county: Option<&str>) -> bool {
        if let Some(business) = &self.business
            && &case.business != business
        {
            return false;
        }
        if let Some(wanted) = &self.county
            && county != Some(wanted.as_str())
        {
            return false;
        }
        if let Some(status) = &self.case_status
            && &case.case_status != status
        {
            return false;
        }
        match self.user_status {
            Some(UserStatusFilter::Unset) => case.user_status.is_none(),
            Some(UserStatusFilter::Is(status)) => case.user_status == Some(status),
            None => true,
        }
    }

    /// Applies the filter, resolving each case's county through
    /// `counties` (query id -> county).
    #[must_use]
    pub fn apply(&self, cases: Vec<Case>, counties: &HashMap<QueryId, String>) -> Vec<Case> {
        cases
            .into_iter()
            .filter(|case| {
                let county = counties.get(&case.query_id).map(String::as_str);
                self.matches(case, county)
            })
            .collect()
    }
}

/// Distinct values offered by the case view's filter selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub businesses: Vec<String>,
    pub counties: Vec<String>,
    pub case_statuses: Vec<String>,
    pub user_statuses: Vec<String>,
}

impl FilterOptions {
    #[must_use]
    pub fn collect(cases: &[Case], counties: &HashMap<QueryId, String>) -> Self {
        let businesses: BTreeSet<&str> = cases.iter().map(|c| c.business.as_str()).collect();
        let case_statuses: BTreeSet<&str> = cases.iter().map(|c| c.case_status.as_str()).collect();
        let case_counties: BTreeSet<&str> = cases
            .iter()
            .filter_map(|c| counties.get(&c.query_id))
            .map(String::as_str)
            .collect();

        let mut user_statuses = vec!["none".to_string()];
        user_statuses.extend(UserStatus::ALL.iter().map(|s| s.as_str().to_string()));

        Self {
            businesses: businesses.into_iter().map(str::to_string).collect(),
            counties: case_counties.into_iter().map(str::to_string).collect(),
            case_statuses: case_statuses.into_iter().map(str::to_string).collect(),
            user_statuses,
        }
    }
}
