//! Per-session submission form.
//!
//! Each handler loads the draft from the session, applies one change and
//! writes it back before responding.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::validate_date;
use super::{ApiError, ApiResponse, AppState, DraftDto, SearchRequest, SetCountyRequest};
use crate::models::ValidationError;
use crate::models::draft::SubmissionDraft;
use crate::models::query::{Query, SearchQuery};
use crate::services::SubmitError;

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NoSuchSearch(index) => Self::not_found("Search", index),
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => e.into(),
            SubmitError::Trigger(e) => Self::workflow_error(e.to_string()),
            SubmitError::CaseNotFound(id) => Self::not_found("Case", id),
            SubmitError::Database(msg) => Self::DatabaseError(msg),
            SubmitError::Internal(msg) => Self::internal(msg),
        }
    }
}

async fn load_draft(session: &Session) -> Result<SubmissionDraft, ApiError> {
    session
        .get::<SubmissionDraft>(SubmissionDraft::SESSION_KEY)
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

async fn save_draft(session: &Session, draft: &SubmissionDraft) -> Result<(), ApiError> {
    session
        .insert(SubmissionDraft::SESSION_KEY, draft)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

fn respond(draft: &SubmissionDraft) -> Json<ApiResponse<DraftDto>> {
    Json(ApiResponse::success(DraftDto::from(draft)))
}

pub async fn get_draft(session: Session) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let draft = load_draft(&session).await?;
    Ok(respond(&draft))
}

pub async fn clear_draft(session: Session) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let mut draft = load_draft(&session).await?;
    draft.clear();
    save_draft(&session, &draft).await?;
    Ok(respond(&draft))
}

pub async fn set_county(
    session: Session,
    Json(payload): Json<SetCountyRequest>,
) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let mut draft = load_draft(&session).await?;
    draft.set_county(&payload.county);
    save_draft(&session, &draft).await?;
    Ok(respond(&draft))
}

/// `POST /api/draft/searches`
///
/// Appends a search, or saves over the one currently being edited.
pub async fn add_search(
    session: Session,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let search = SearchQuery::new(
        payload.business,
        validate_date("startDate", &payload.start_date)?,
        validate_date("endDate", &payload.end_date)?,
    )?;

    let mut draft = load_draft(&session).await?;
    draft.add_search(search)?;
    save_draft(&session, &draft).await?;
    Ok(respond(&draft))
}

pub async fn begin_edit(
    session: Session,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let mut draft = load_draft(&session).await?;
    draft.begin_edit(index)?;
    save_draft(&session, &draft).await?;
    Ok(respond(&draft))
}

pub async fn cancel_edit(session: Session) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let mut draft = load_draft(&session).await?;
    draft.cancel_edit();
    save_draft(&session, &draft).await?;
    Ok(respond(&draft))
}

pub async fn remove_search(
    session: Session,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<DraftDto>>, ApiError> {
    let mut draft = load_draft(&session).await?;
    draft.remove_search(index)?;
    save_draft(&session, &draft).await?;
    Ok(respond(&draft))
}

/// `POST /api/draft/submit`
///
/// Hands the draft to the workflow. The draft is cleared only after the
/// query was triggered and saved; on failure it is kept for a retry.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Query>>, ApiError> {
    let mut draft = load_draft(&session).await?;
    if !draft.can_submit() {
        return Err(ApiError::validation(
            "A county and at least one search are required",
        ));
    }

    let query = state.submission_service().submit(&draft).await?;

    draft.clear();
    save_draft(&session, &draft).await?;

    Ok(Json(ApiResponse::success(query)))
}
