//! HTTP command endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use xbgw_command::CommandRouter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    router: Arc<CommandRouter>,
}

impl AppState {
    pub fn new(router: CommandRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "Rejected command batch");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/do_command", post(do_command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run a `do_command` batch and return the concatenated replies
async fn do_command(State(state): State<AppState>, body: String) -> Result<Response, ApiError> {
    let xml = state
        .router
        .process_batch(&body)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}
