//! Local public-directory backend for development.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::host::MediaHost;
use super::model::{basename, file_stem, is_image_file, ImageUpload, MediaAsset, MediaError, MediaResult};

/// Serves images straight out of a public directory, at `/<filename>`.
#[derive(Debug, Clone)]
pub struct LocalHost {
    dir: PathBuf,
}

impl LocalHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn asset_for(filename: &str) -> MediaAsset {
        MediaAsset::new(file_stem(filename), format!("/{filename}")).with_filename(filename)
    }
}

#[async_trait]
impl MediaHost for LocalHost {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, upload: ImageUpload) -> MediaResult<MediaAsset> {
        let filename = basename(&upload.filename);
        if filename.is_empty() || filename == "." || filename == ".." {
            return Err(MediaError::InvalidFilename(upload.filename.clone()));
        }

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(filename), &upload.bytes).await?;
        Ok(Self::asset_for(filename))
    }

    async fn list(&self) -> MediaResult<Vec<MediaAsset>> {
        match fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(MediaError::NotFound("Public directory not found".into())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::NotFound("Public directory not found".into()))
            }
            Err(e) => return Err(e.into()),
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_image_file(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        Ok(names.iter().map(|name| Self::asset_for(name)).collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_and_sorts_images() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta.PNG", "alpha.jpg", "notes.txt", "logo.svg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let assets = LocalHost::new(dir.path()).list().await.unwrap();

        let names: Vec<_> = assets.iter().map(|a| a.filename.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["alpha.jpg", "logo.svg", "zeta.PNG"]);
        assert_eq!(assets[0].id, "alpha");
        assert_eq!(assets[0].url, "/alpha.jpg");
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalHost::new(dir.path().join("public")).list().await.unwrap_err();
        assert!(matches!(err, MediaError::NotFound(ref msg) if msg == "Public directory not found"));
    }

    #[tokio::test]
    async fn test_upload_strips_path_components() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        let host = LocalHost::new(&public);

        let asset = host
            .upload(ImageUpload::new("../../escape/logo.png", b"png".to_vec()))
            .await
            .unwrap();

        assert_eq!(asset.url, "/logo.png");
        assert_eq!(std::fs::read(public.join("logo.png")).unwrap(), b"png");
        assert!(!dir.path().join("escape").exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalHost::new(dir.path())
            .upload(ImageUpload::new("uploads/", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidFilename(_)));
    }
}
