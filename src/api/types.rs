use serde::{Deserialize, Serialize};

use crate::models::draft::SubmissionDraft;
use crate::models::query::SearchQuery;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// The session draft as shown to the form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDto {
    pub county: String,
    pub searches: Vec<SearchQuery>,
    pub editing: Option<usize>,
    pub editing_search: Option<SearchQuery>,
    pub can_submit: bool,
}

impl From<&SubmissionDraft> for DraftDto {
    fn from(draft: &SubmissionDraft) -> Self {
        Self {
            county: draft.county.clone(),
            searches: draft.searches.clone(),
            editing: draft.editing,
            editing_search: draft.editing_search().cloned(),
            can_submit: draft.can_submit(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetCountyRequest {
    pub county: String,
}

/// Dates arrive as `YYYY-MM-DD` strings and are parsed by the handler so
/// that malformed input is a plain validation error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub business: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUserStatusRequest {
    pub case_ids: Vec<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResult {
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadCasesRequest {
    pub case_ids: Vec<String>,
}

/// Query-string filters for the case list. Empty values and `All` mean no
/// filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseListParams {
    pub business: Option<String>,
    pub county: Option<String>,
    pub case_status: Option<String>,
    pub user_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database: bool,
    pub workflow: &'static str,
}
