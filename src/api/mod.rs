use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::extract::DocumentExtractor;
use crate::services::{CaseService, QueryService, SubmissionService};
use crate::state::SharedState;

mod assets;
mod cases;
mod draft;
mod error;
mod extract;
mod observability;
mod queries;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn case_service(&self) -> &Arc<dyn CaseService> {
        &self.shared.case_service
    }

    #[must_use]
    pub fn query_service(&self) -> &Arc<dyn QueryService> {
        &self.shared.query_service
    }

    #[must_use]
    pub fn submission_service(&self) -> &Arc<dyn SubmissionService> {
        &self.shared.submission_service
    }

    #[must_use]
    pub fn extractor(&self) -> &Arc<dyn DocumentExtractor> {
        &self.shared.extractor
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (server, max_pdf_bytes) = {
        let config = state.config().read().await;
        (config.server.clone(), config.extraction.max_pdf_bytes)
    };

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));

    // Base64 inflates by a third, plus room for the JSON envelope.
    let extract_body_limit = max_pdf_bytes / 3 * 4 + 64 * 1024;

    let api_router = Router::new()
        .route("/system/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .merge(draft_routes().layer(session_layer))
        .route("/queries", get(queries::list_queries))
        .route("/queries/active", get(queries::list_active_queries))
        .route("/queries/{id}", get(queries::get_query))
        .route("/queries/{id}/status", post(queries::advance_status))
        .route("/queries/{id}/cases", post(queries::import_cases))
        .route("/cases", get(cases::list_cases))
        .route("/cases/filters", get(cases::filter_options))
        .route("/cases/user-status", post(cases::bulk_update_user_status))
        .route("/cases/reload", post(cases::reload_cases))
        .route("/cases/{id}", get(cases::get_case))
        .route(
            "/extract",
            post(extract::extract_document).layer(DefaultBodyLimit::max(extract_body_limit)),
        )
        .route_layer(middleware::from_fn(observability::request_middleware))
        .with_state(state);

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .fallback(assets::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

/// Routes that read or write the session draft.
fn draft_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/draft", get(draft::get_draft).delete(draft::clear_draft))
        .route("/draft/county", put(draft::set_county))
        .route("/draft/searches", post(draft::add_search))
        .route(
            "/draft/searches/{index}",
            axum::routing::delete(draft::remove_search),
        )
        .route("/draft/searches/{index}/edit", post(draft::begin_edit))
        .route("/draft/cancel-edit", post(draft::cancel_edit))
        .route("/draft/submit", post(draft::submit))
}
