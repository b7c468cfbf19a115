//! JSON body returned by a successful upload.

use serde::{Deserialize, Serialize};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub message: String,

    /// Absolute download link for the stored archive.
    pub file_url: String,
}

impl UploadResponse {
    pub fn success(file_url: impl Into<String>) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.into(),
            file_url: file_url.into(),
        }
    }
}
