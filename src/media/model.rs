//! Data models and errors for the image service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Folder that uploads through the HTTP API land in.
pub const UPLOAD_FOLDER: &str = "core-images";

/// Folder for site assets pushed by `sync-constants`.
pub const ASSET_FOLDER: &str = "scpc-assets";

/// Extensions the local backend treats as images (matched case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

// =============================================================================
// ASSETS
// =============================================================================

/// A hosted image as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl MediaAsset {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            filename: None,
        }
    }

    /// Builder: Set the stored filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// One image to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-supplied filename. May contain path components.
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Target folder; backends fall back to their own default.
    pub folder: Option<String>,
    /// Requested public id; backends pick one if unset.
    pub public_id: Option<String>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
            folder: None,
            public_id: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    /// Final path component of the client filename.
    pub fn basename(&self) -> &str {
        basename(&self.filename)
    }
}

/// Last component of `name`, splitting on both `/` and `\`.
pub fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// `name` without its extension. Dotfiles keep their name.
pub fn file_stem(name: &str) -> &str {
    let name = basename(name);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// True if `name` has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(name: &str) -> bool {
    let name = basename(name);
    match name.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = &name[dot + 1..];
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Result type alias for image service operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors from image backends and request handling.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Upload request carried no `image` field.
    #[error("Image is required")]
    MissingImage,

    /// Filename is empty or only path components.
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("{0}")]
    NotFound(String),

    /// Malformed multipart body.
    #[error("Multipart error: {0}")]
    Multipart(String),

    /// Transport error talking to the media host.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Media host answered with an error.
    #[error("Media host error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required credential is not configured.
    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

impl MediaError {
    /// Creates an Api error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            MediaError::MissingImage
            | MediaError::InvalidFilename(_)
            | MediaError::Multipart(_) => StatusCode::BAD_REQUEST,
            MediaError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "image request failed");
        }
        let message = self.to_string();
        let body = if matches!(self, MediaError::MissingImage) {
            json!({ "message": message })
        } else {
            json!({ "error": message })
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename_strips_paths() {
        assert_eq!(basename("../../etc/logo.png"), "logo.png");
        assert_eq!(basename(r"C:\Users\me\logo.png"), "logo.png");
        assert_eq!(basename("logo.png"), "logo.png");
        assert_eq!(basename("dir/"), "");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("/scpc.png"), "scpc");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem(".env"), ".env");
        assert_eq!(file_stem("README"), "README");
    }

    #[test]
    fn test_image_extensions_case_insensitive() {
        assert!(is_image_file("logo.PNG"));
        assert!(is_image_file("photo.Jpeg"));
        assert!(is_image_file("icon.svg"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file(".png"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn test_asset_serialization_skips_missing_filename() {
        let hosted = serde_json::to_value(MediaAsset::new("core-images/a", "https://x/a.png")).unwrap();
        assert_eq!(hosted, json!({ "id": "core-images/a", "url": "https://x/a.png" }));

        let local = serde_json::to_value(MediaAsset::new("a", "/a.png").with_filename("a.png")).unwrap();
        assert_eq!(local["filename"], "a.png");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(MediaError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            MediaError::NotFound("Public directory not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MediaError::api(401, "Invalid Signature").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
