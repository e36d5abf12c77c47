use chrono::NaiveDate;

use super::ApiError;
use crate::domain::{CaseId, QueryId, QueryStatus, UserStatus};
use crate::models::case::UserStatusFilter;

const MAX_BULK_CASES: usize = 1000;

pub fn validate_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::validation(format!(
            "Invalid {field}: '{value}'. Dates must be YYYY-MM-DD"
        ))
    })
}

pub fn validate_query_id(id: &str) -> Result<QueryId, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Query ID cannot be empty"));
    }
    Ok(QueryId::from(trimmed))
}

/// Trims, drops duplicates (keeping first occurrence) and bounds the list.
pub fn validate_case_ids(ids: &[String]) -> Result<Vec<CaseId>, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::validation("No cases selected"));
    }
    if ids.len() > MAX_BULK_CASES {
        return Err(ApiError::validation(format!(
            "Too many cases: {}. At most {} can be updated at once",
            ids.len(),
            MAX_BULK_CASES
        )));
    }

    let mut out: Vec<CaseId> = Vec::with_capacity(ids.len());
    for id in ids {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ApiError::validation("Case ID cannot be empty"));
        }
        let id = CaseId::from(trimmed);
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}

pub fn parse_user_status(value: &str) -> Result<UserStatus, ApiError> {
    value
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|e| ApiError::validation(format!("{e}. Expected sent, response or contract")))
}

pub fn parse_query_status(value: &str) -> Result<QueryStatus, ApiError> {
    value
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|e| ApiError::validation(format!("{e}")))
}

/// `None`, blank and `All` (any case) mean "no filter".
pub fn filter_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

pub fn parse_user_status_filter(value: Option<&str>) -> Result<Option<UserStatusFilter>, ApiError> {
    filter_value(value)
        .map(|v| {
            v.to_ascii_lowercase()
                .parse()
                .map_err(|e| ApiError::validation(format!("{e}")))
        })
        .transpose()
}
