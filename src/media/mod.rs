//! Image hosting service.
//!
//! A small HTTP surface over a pluggable [`MediaHost`] backend: Cloudinary
//! for production, a local public directory for development.

pub mod cloudinary;
pub mod constants;
pub mod host;
pub mod local;
pub mod model;
pub mod routes;

// Re-exports for convenience
pub use cloudinary::{CloudinaryCredentials, CloudinaryHost};
pub use constants::{sync_constants, LocalConstant, SyncEntry, SyncReport, SyncStatus};
pub use host::{MediaHost, SharedHost};
pub use local::LocalHost;
pub use model::{ImageUpload, MediaAsset, MediaError, MediaResult, ASSET_FOLDER, UPLOAD_FOLDER};
pub use routes::{router, RouterOptions};
