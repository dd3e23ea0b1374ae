//! File upload routes.

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use bucketdrop_core::storage::ObjectStoreConnector;
use bucketdrop_core::upload::{IncomingFile, UploadError};
use bucketdrop_shared::StorageSettingsSource;
use bytes::BytesMut;
use serde::Serialize;
use tracing::{debug, error};

use crate::AppState;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "uploads";

/// Creates the upload routes.
pub fn routes<C, S>() -> Router<AppState<C, S>>
where
    C: ObjectStoreConnector + 'static,
    S: StorageSettingsSource + 'static,
{
    Router::new().route("/", get(index).post(upload_file::<C, S>))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a stored upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Upload result.
    pub data: UploadData,
}

/// Data of a stored upload.
#[derive(Debug, Serialize)]
pub struct UploadData {
    /// Generated object name.
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// Response for a failed upload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Which step failed.
    pub message: &'static str,
    /// Machine-readable error code.
    pub code: &'static str,
    /// Underlying error or offending value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&UploadError> for ErrorResponse {
    fn from(err: &UploadError) -> Self {
        let detail = err.detail();
        Self {
            status: err.status_code(),
            message: err.summary(),
            code: err.error_code(),
            error: (!detail.is_empty()).then_some(detail),
        }
    }
}

fn error_response(err: &UploadError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Read the first file carried by the `uploads` field, enforcing `max_file_size`.
async fn read_upload_field(
    mut multipart: Multipart,
    max_file_size: u64,
) -> Result<IncomingFile, UploadError> {
    let classify = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::file_too_large(max_file_size)
        } else {
            UploadError::file_field_missing(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(classify)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_owned) else {
            return Err(UploadError::file_field_missing(format!(
                "form field '{UPLOAD_FIELD}' does not carry a file"
            )));
        };
        let content_type = field.content_type().map(str::to_owned);

        let mut body = BytesMut::new();
        let mut total_size = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(classify)? {
            total_size += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            if total_size > max_file_size {
                return Err(UploadError::file_too_large(max_file_size));
            }
            body.extend_from_slice(&chunk);
        }

        return Ok(IncomingFile::new(filename, content_type, body.freeze()));
    }

    Err(UploadError::file_field_missing(format!(
        "form field '{UPLOAD_FIELD}' is missing"
    )))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/`
async fn index() -> &'static str {
    "test"
}

/// POST `/`
/// Store the file from the `uploads` field under a randomized name.
async fn upload_file<C, S>(
    State(state): State<AppState<C, S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    C: ObjectStoreConnector + 'static,
    S: StorageSettingsSource + 'static,
{
    let file = match multipart {
        Ok(multipart) => read_upload_field(multipart, state.uploads.max_file_size()).await,
        Err(rejection) => Err(UploadError::file_field_missing(rejection.body_text())),
    };

    let file = match file {
        Ok(file) => file,
        Err(e) => {
            error!(error = %e, "Image upload error");
            return error_response(&e);
        }
    };

    match state.uploads.upload(file).await {
        Ok(stored) => (
            StatusCode::CREATED,
            Json(UploadResponse {
                status: StatusCode::CREATED.as_u16(),
                message: "Image uploaded successfully",
                data: UploadData {
                    file_name: stored.file_name.into_string(),
                },
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
