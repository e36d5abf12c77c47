use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::extract::{ExtractRequest, ExtractedDocument};

/// `POST /api/extract`
///
/// Body `{pdf_url?, pdf_content?}` with `pdf_content` base64-encoded.
/// Missing, malformed or oversized input is a 400; any failure while
/// reading the document is a 500 prefixed with "Failed to parse PDF".
pub async fn extract_document(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ExtractedDocument>>, ApiError> {
    let max_bytes = state.config().read().await.extraction.max_pdf_bytes;

    let Json(payload) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::validation(format!("PDF is too large (limit {max_bytes} bytes)"))
        } else {
            ApiError::validation(rejection.body_text())
        }
    })?;
    let source = payload.source(max_bytes)?;

    let document = state.extractor().extract(source).await?;

    tracing::debug!(
        pages = document.metadata.pages,
        chars = document.text.len(),
        "Document extracted"
    );
    Ok(Json(ApiResponse::success(document)))
}
