use axum::{
    Json,
    extract::{Path, Query as QueryParams, State},
};
use std::sync::Arc;

use super::validation::{
    filter_value, parse_user_status, parse_user_status_filter, validate_case_ids,
};
use super::{
    ApiError, ApiResponse, AppState, BulkUpdateResult, BulkUserStatusRequest, CaseListParams,
    ReloadCasesRequest,
};
use crate::domain::CaseId;
use crate::models::case::{Case, CaseFilter, FilterOptions};
use crate::models::query::Query;
use crate::services::{CaseError, CaseRow};

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::NotFound(id) => Self::not_found("Case", id),
            CaseError::QueryNotFound(id) => Self::not_found("Query", id),
            CaseError::Validation(msg) => Self::validation(msg),
            CaseError::Database(msg) => Self::DatabaseError(msg),
            CaseError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/cases?business=&county=&caseStatus=&userStatus=`
///
/// `userStatus=none` selects cases without a user status.
pub async fn list_cases(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<CaseListParams>,
) -> Result<Json<ApiResponse<Vec<CaseRow>>>, ApiError> {
    let filter = CaseFilter {
        business: filter_value(params.business.as_deref()),
        county: filter_value(params.county.as_deref()),
        case_status: filter_value(params.case_status.as_deref()),
        user_status: parse_user_status_filter(params.user_status.as_deref())?,
    };

    let cases = state.case_service().list_cases(&filter).await?;
    Ok(Json(ApiResponse::success(cases)))
}

pub async fn filter_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<FilterOptions>>, ApiError> {
    let options = state.case_service().filter_options().await?;
    Ok(Json(ApiResponse::success(options)))
}

pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Case>>, ApiError> {
    let case = state.case_service().get_case(&CaseId::from(id)).await?;
    Ok(Json(ApiResponse::success(case)))
}

/// `POST /api/cases/user-status`
///
/// All-or-nothing: one unknown id fails the request and changes nothing.
pub async fn bulk_update_user_status(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkUserStatusRequest>,
) -> Result<Json<ApiResponse<BulkUpdateResult>>, ApiError> {
    let ids = validate_case_ids(&payload.case_ids)?;
    let status = parse_user_status(&payload.status)?;

    let updated = state
        .case_service()
        .set_user_status_many(&ids, status)
        .await?;

    Ok(Json(ApiResponse::success(BulkUpdateResult { updated })))
}

/// `POST /api/cases/reload`
///
/// Submits fresh queries covering the selected cases.
pub async fn reload_cases(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReloadCasesRequest>,
) -> Result<Json<ApiResponse<Vec<Query>>>, ApiError> {
    let ids = validate_case_ids(&payload.case_ids)?;
    let queries = state.submission_service().reload_cases(&ids).await?;
    Ok(Json(ApiResponse::success(queries)))
}
