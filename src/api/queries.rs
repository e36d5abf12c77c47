use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::{parse_query_status, validate_query_id};
use super::{AdvanceStatusRequest, ApiError, ApiResponse, AppState};
use crate::models::case::NewCase;
use crate::models::query::Query;
use crate::services::{ImportSummary, QueryError};

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(id) => Self::not_found("Query", id),
            e @ QueryError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
            QueryError::Database(msg) => Self::DatabaseError(msg),
            QueryError::Internal(msg) => Self::internal(msg),
        }
    }
}

pub async fn list_queries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Query>>>, ApiError> {
    let queries = state.query_service().list_queries().await?;
    Ok(Json(ApiResponse::success(queries)))
}

/// Queries the workflow has not finished yet (sidebar list).
pub async fn list_active_queries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Query>>>, ApiError> {
    let queries = state.query_service().list_active_queries().await?;
    Ok(Json(ApiResponse::success(queries)))
}

pub async fn get_query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Query>>, ApiError> {
    let id = validate_query_id(&id)?;
    let query = state.query_service().get_query(&id).await?;
    Ok(Json(ApiResponse::success(query)))
}

/// `POST /api/queries/{id}/status`
///
/// Status callback from the workflow. Only forward moves are accepted;
/// anything else is a 409.
pub async fn advance_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<Json<ApiResponse<Query>>, ApiError> {
    let id = validate_query_id(&id)?;
    let next = parse_query_status(&payload.status)?;
    let query = state.query_service().advance_status(&id, next).await?;
    Ok(Json(ApiResponse::success(query)))
}

/// `POST /api/queries/{id}/cases`
///
/// Loads workflow results for the query. Existing case ids are
/// overwritten but keep their user status.
pub async fn import_cases(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(cases): Json<Vec<NewCase>>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let id = validate_query_id(&id)?;
    let summary = state.case_service().import_cases(&id, cases).await?;
    Ok(Json(ApiResponse::success(summary)))
}
