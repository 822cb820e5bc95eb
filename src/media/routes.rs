//! HTTP routes for the image service.
//!
//! The image routes are mounted twice, at `/images` and `/api/images`, so
//! both the standalone service path and the site's API path work.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::host::SharedHost;
use super::model::{ImageUpload, MediaAsset, MediaError, MediaResult};

/// Default request body limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Router-level settings.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Allowed CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Builds the image service router.
pub fn router(host: SharedHost, options: &RouterOptions) -> Router {
    let images = get(list_images).post(upload_image);

    Router::new()
        .route("/health", get(health))
        .route("/images", images.clone())
        .route("/api/images", images)
        .with_state(host)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(options.max_upload_bytes))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn list_images(State(host): State<SharedHost>) -> MediaResult<Json<Vec<MediaAsset>>> {
    let assets = host.list().await?;
    Ok(Json(assets))
}

async fn upload_image(
    State(host): State<SharedHost>,
    mut multipart: Multipart,
) -> MediaResult<(StatusCode, Json<MediaAsset>)> {
    let upload = read_image_field(&mut multipart).await?;
    let size = upload.bytes.len();
    let asset = host.upload(upload).await?;
    info!(id = %asset.id, size, backend = host.name(), "image uploaded");
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Pulls the `image` field out of a multipart body, skipping anything else.
async fn read_image_field(multipart: &mut Multipart) -> MediaResult<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MediaError::Multipart(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| MediaError::Multipart(e.to_string()))?;
        return Ok(ImageUpload::new(filename, bytes.to_vec()).with_content_type(content_type));
    }
    Err(MediaError::MissingImage)
}

// =============================================================================
// TESTS
// =============================================================================
