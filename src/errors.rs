use crate::services::storage_service::StorageError;
use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
///
/// Rendered as a plain-text body so clients see exactly one short line.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    /// The upload request had no usable `file` part.
    pub fn missing_file() -> Self {
        Self::bad_request("Failed to retrieve file")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "{}", self.message);
        }
        (self.status, self.message).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::InvalidFileName(_) => AppError::bad_request("Invalid file name"),
            StorageError::NotFound(_) => AppError::not_found("File not found"),
            other => {
                tracing::debug!("storage failure: {}", other);
                AppError::internal(match other {
                    StorageError::CreateDir(_) => "Failed to create upload directory",
                    StorageError::CreateArchive(_) => "Failed to create zip file",
                    StorageError::CreateEntry(_) => "Failed to create file in zip",
                    StorageError::WriteEntry(_) => "Failed to save file in zip",
                    StorageError::Finalize(_) => "Failed to close zip writer",
                    _ => "Internal storage error",
                })
            }
        }
    }
}

/// A body that blew the size limit reads as "File too large"; anything else
/// is a malformed multipart body.
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::bad_request("File too large")
        } else {
            tracing::debug!("multipart parse failure: {}", err.body_text());
            AppError::bad_request("Malformed multipart body")
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        tracing::debug!("multipart rejected: {}", err.body_text());
        AppError::bad_request("Malformed multipart body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn storage_errors_map_to_http_statuses() {
        let cases = [
            (
                StorageError::InvalidFileName("../x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (StorageError::NotFound("1.zip".into()), StatusCode::NOT_FOUND),
            (
                StorageError::CreateDir(io::Error::other("denied")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StorageError::WriteEntry(io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn storage_error_messages_stay_generic() {
        let err = AppError::from(StorageError::CreateArchive(io::Error::other(
            "/srv/private/path",
        )));
        assert_eq!(err.message, "Failed to create zip file");
    }

    #[test]
    fn responses_are_plain_text() {
        let response = AppError::method_not_allowed().into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));
    }
}
