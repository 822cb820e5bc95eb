//! Backend seam for the image service.

use async_trait::async_trait;
use std::sync::Arc;

use super::model::{ImageUpload, MediaAsset, MediaResult};

/// Where images are stored and listed from.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Stores one image and returns how to reach it.
    async fn upload(&self, upload: ImageUpload) -> MediaResult<MediaAsset>;

    /// Lists the images this backend serves.
    async fn list(&self) -> MediaResult<Vec<MediaAsset>>;
}

/// Backend shared across request handlers.
pub type SharedHost = Arc<dyn MediaHost>;
