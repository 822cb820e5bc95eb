//! Cloudinary backend.
//!
//! Uploads are signed multipart requests; listing goes through the Search
//! API with basic auth.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::host::MediaHost;
use super::model::{ImageUpload, MediaAsset, MediaError, MediaResult, UPLOAD_FOLDER};

/// Default Cloudinary API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Cap on search results per listing.
pub const MAX_RESULTS: u32 = 50;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Account credentials.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryCredentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Reads `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY` and
    /// `CLOUDINARY_API_SECRET`.
    pub fn from_env() -> MediaResult<Self> {
        fn var(name: &str) -> MediaResult<String> {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| MediaError::MissingCredential(name.to_string()))
        }
        Ok(Self::new(
            var("CLOUDINARY_CLOUD_NAME")?,
            var("CLOUDINARY_API_KEY")?,
            var("CLOUDINARY_API_SECRET")?,
        ))
    }
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// SHA-256 request signature: `k=v` pairs sorted by key, joined with `&`,
/// followed by the API secret.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let payload = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<UploadResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary-backed [`MediaHost`].
#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    http: Client,
    credentials: CloudinaryCredentials,
    base_url: String,
    folder: String,
}

impl CloudinaryHost {
    pub fn new(credentials: CloudinaryCredentials) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            credentials,
            base_url: DEFAULT_API_BASE.to_string(),
            folder: UPLOAD_FOLDER.to_string(),
        })
    }

    /// Builder: Point at a different API base (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder: Folder used for uploads without one and for listing.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.credentials.cloud_name,
            path
        )
    }

    async fn api_error(response: reqwest::Response) -> MediaError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        MediaError::api(status, message)
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, upload: ImageUpload) -> MediaResult<MediaAsset> {
        let folder = upload.folder.clone().unwrap_or_else(|| self.folder.clone());
        let mut params = vec![
            ("folder", folder),
            ("timestamp", unix_timestamp().to_string()),
        ];
        if let Some(public_id) = &upload.public_id {
            params.push(("public_id", public_id.clone()));
        }
        let signature = sign(&params, &self.credentials.api_secret);

        let filename = upload.basename().to_string();
        let mut part = Part::bytes(upload.bytes).file_name(filename);
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }
        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .http
            .post(self.url("image/upload"))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: UploadResponse = response.json().await?;
        debug!(public_id = %body.public_id, "uploaded to cloudinary");
        Ok(MediaAsset::new(body.public_id, body.secure_url))
    }

    async fn list(&self) -> MediaResult<Vec<MediaAsset>> {
        let query = json!({
            "expression": format!("folder:{}", self.folder),
            "sort_by": [{ "created_at": "desc" }],
            "max_results": MAX_RESULTS,
        });

        let response = self
            .http
            .post(self.url("resources/search"))
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .json(&query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: SearchResponse = response.json().await?;
        Ok(body
            .resources
            .into_iter()
            .map(|r| MediaAsset::new(r.public_id, r.secure_url))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
