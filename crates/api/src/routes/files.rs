//! File and space routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use driftbox_core::space::{
    PresignedUrl, SpaceStats, StoredFile, UploadFile, content_disposition, unique_file_name,
};
use driftbox_shared::AppError;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/spaces/{space_id}/files",
            get(list_files).post(upload_file),
        )
        .route("/spaces/{space_id}", delete(clear_space))
        .route("/files/{*key}", delete(delete_file))
        .route("/downloads/{*key}", get(download_file))
        .route("/presigned/{*key}", get(presign_download))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a space listing.
#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    /// Files, most recent first.
    pub files: Vec<StoredFile>,
    /// Aggregate stats.
    pub stats: SpaceStats,
}

/// Response for an upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// The stored file.
    pub file: StoredFile,
}

/// Response for clearing a space.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearSpaceResponse {
    /// Files deleted.
    pub deleted_count: usize,
}

/// Query parameters for presigning.
#[derive(Debug, Deserialize)]
pub struct PresignQuery {
    /// Link lifetime in seconds.
    pub ttl_secs: Option<u64>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/spaces/{space_id}/files`
/// List files and stats of a space.
async fn list_files(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> ApiResult<Json<ListFilesResponse>> {
    let (files, stats) = state.spaces.list_files_with_stats(&space_id).await?;
    Ok(Json(ListFilesResponse { files, stats }))
}

/// POST `/spaces/{space_id}/files`
/// Upload one file from the `file` multipart field.
///
/// The name is sanitized and suffixed until it is free in the space.
async fn upload_file(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("file").to_string();
        let content_type = field.content_type().map(String::from);
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some(UploadFile::new(name, content_type, data));
        break;
    }

    let Some(mut upload) = upload else {
        return Err(ApiError(AppError::Validation(format!(
            "multipart field `{FILE_FIELD}` is required"
        ))));
    };

    let existing: Vec<String> = state
        .spaces
        .list_files(&space_id)
        .await?
        .into_iter()
        .map(|f| f.name)
        .collect();
    upload.name = unique_file_name(&upload.name, &existing);

    let file = state.spaces.upload_file(&space_id, upload).await?;
    info!(space_id = %space_id, name = %file.name, "Upload accepted");

    Ok((StatusCode::CREATED, Json(UploadResponse { file })))
}

/// DELETE `/spaces/{space_id}`
/// Delete every file of a space.
async fn clear_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> ApiResult<Json<ClearSpaceResponse>> {
    let deleted_count = state.spaces.clear_space(&space_id).await?;
    Ok(Json(ClearSpaceResponse { deleted_count }))
}

/// DELETE `/files/{*key}`
/// Delete one file. Missing files succeed.
async fn delete_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    state.spaces.delete_file(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/downloads/{*key}`
/// Stream a file back through the service as an attachment.
async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let file = state.spaces.download_file(&key).await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&file.name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    )
        .into_response())
}

/// GET `/presigned/{*key}?ttl_secs=`
/// Generate a time-limited download link.
async fn presign_download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PresignQuery>,
) -> ApiResult<Json<PresignedUrl>> {
    let presigned = state
        .spaces
        .generate_presigned_download_url(&key, query.ttl_secs)
        .await?;
    Ok(Json(presigned))
}

fn multipart_error(err: MultipartError) -> ApiError {
    let message = err.body_text();
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(AppError::PayloadTooLarge(message))
    } else {
        ApiError(AppError::Validation(message))
    }
}
