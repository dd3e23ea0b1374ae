//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The upload route and its JSON envelopes
//! - Liveness routes
//! - Router assembly with tracing, timeout and body-limit layers

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bucketdrop_core::storage::ObjectStoreConnector;
use bucketdrop_core::upload::UploadService;
use bucketdrop_shared::StorageSettingsSource;
use tower::ServiceBuilder;
use tower::timeout::error::Elapsed;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::routes::upload::ErrorResponse;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Application state shared across handlers.
pub struct AppState<C, S> {
    /// Upload pipeline.
    pub uploads: Arc<UploadService<C, S>>,
}

impl<C, S> AppState<C, S> {
    /// Creates state around an upload service.
    #[must_use]
    pub fn new(uploads: UploadService<C, S>) -> Self {
        Self {
            uploads: Arc::new(uploads),
        }
    }
}

impl<C, S> Clone for AppState<C, S> {
    fn clone(&self) -> Self {
        Self {
            uploads: Arc::clone(&self.uploads),
        }
    }
}

/// Creates the main application router.
pub fn create_router<C, S>(state: AppState<C, S>, request_timeout: Duration) -> Router
where
    C: ObjectStoreConnector + 'static,
    S: StorageSettingsSource + 'static,
{
    let body_limit = usize::try_from(state.uploads.max_file_size().saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Turns middleware failures into the same JSON envelope the handlers use.
async fn handle_middleware_error(err: BoxError) -> Response {
    let (status, body) = if err.is::<Elapsed>() {
        warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            ErrorResponse {
                status: StatusCode::REQUEST_TIMEOUT.as_u16(),
                message: "Request timed out",
                code: "REQUEST_TIMEOUT",
                error: None,
            },
        )
    } else {
        error!(error = %err, "Unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message: "Internal server error",
                code: "INTERNAL_ERROR",
                error: Some(err.to_string()),
            },
        )
    };

    (status, Json(body)).into_response()
}
