//! HTTP handlers for uploading files and downloading the resulting archives.
//! Request bodies are streamed chunk by chunk into the archive writer and
//! archives are streamed back out, so neither direction buffers a whole file.

use crate::{
    errors::AppError,
    models::upload::UploadResponse,
    services::storage_service::PendingArchive,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Name of the multipart part carrying the upload.
pub const FILE_FIELD: &str = "file";

/// `POST /upload` — archive the `file` part and return its download link.
///
/// Parts other than `file` are skipped. The first `file` part wins; it must
/// carry a filename, which becomes the archive entry name.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(AppError::missing_file()),
        };

        let mut pending = state
            .storage
            .begin_archive(&original_name, state.config.id_strategy)
            .await?;

        if let Err(err) = copy_field(&mut field, &mut pending).await {
            debug!(id = pending.id(), "upload failed: {}", err);
            pending.abort().await;
            return Err(err);
        }

        let stored = pending.commit().await?;
        info!(
            id = %stored.id,
            entry = %stored.entry_name,
            size_bytes = stored.size_bytes,
            "stored upload"
        );

        let body = UploadResponse::success(state.config.download_url(&stored.file_name));
        return Ok((StatusCode::OK, Json(body)));
    }

    Err(AppError::missing_file())
}

async fn copy_field(field: &mut Field<'_>, pending: &mut PendingArchive) -> Result<(), AppError> {
    while let Some(chunk) = field.chunk().await? {
        pending.write(chunk).await?;
    }
    Ok(())
}

/// Any method other than POST on `/upload`.
pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

/// `GET /file/{name}` — stream a stored archive.
pub async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (file, len) = state.storage.open_archive(&name).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    Ok(response)
}
