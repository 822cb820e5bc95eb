//! Pushes locally referenced site assets to the media host and rewrites the
//! constants file to point at the hosted URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

use super::host::MediaHost;
use super::model::{basename, file_stem, ImageUpload, MediaError, MediaResult, ASSET_FOLDER};

static LOCAL_CONSTANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"export const (\w+) = "(/[^"]+)";"#).unwrap_or_else(|e| panic!("bad constant pattern: {e}"))
});

/// `export const NAME = "/local/path";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConstant {
    pub name: String,
    /// Site-absolute path, leading slash included.
    pub path: String,
}

impl LocalConstant {
    /// Public id the asset is uploaded under.
    pub fn public_id(&self) -> &str {
        file_stem(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Uploaded { url: String },
    /// No such file under the public directory.
    Missing,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub constant: LocalConstant,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub entries: Vec<SyncEntry>,
    /// Whether the constants file was rewritten.
    pub changed: bool,
}

impl SyncReport {
    pub fn uploaded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, SyncStatus::Uploaded { .. }))
            .count()
    }
}

/// Constants in `source` that still point at local paths.
pub fn find_local_constants(source: &str) -> Vec<LocalConstant> {
    LOCAL_CONSTANT
        .captures_iter(source)
        .map(|caps| LocalConstant {
            name: caps[1].to_string(),
            path: caps[2].to_string(),
        })
        .collect()
}

/// Replaces the first quoted occurrence of `local_path` with `url`.
pub fn replace_path(source: &str, local_path: &str, url: &str) -> String {
    source.replacen(&format!("\"{local_path}\""), &format!("\"{url}\""), 1)
}

/// Uploads every local asset referenced from `constants_path` and rewrites
/// the file. `on_entry` is called once per constant, in file order.
///
/// Upload failures and missing files are reported per entry; only failing
/// to read or write the constants file itself is an error.
pub async fn sync_constants<F>(
    host: &dyn MediaHost,
    constants_path: &Path,
    public_dir: &Path,
    mut on_entry: F,
) -> MediaResult<SyncReport>
where
    F: FnMut(&SyncEntry),
{
    let mut content = match fs::read_to_string(constants_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::NotFound(format!(
                "constants file not found: {}",
                constants_path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let mut report = SyncReport::default();
    for constant in find_local_constants(&content) {
        let file_path = public_dir.join(constant.path.trim_start_matches('/'));
        let status = match fs::read(&file_path).await {
            Ok(bytes) => {
                let upload = ImageUpload::new(basename(&constant.path), bytes)
                    .with_folder(ASSET_FOLDER)
                    .with_public_id(constant.public_id());
                match host.upload(upload).await {
                    Ok(asset) => {
                        info!(name = %constant.name, url = %asset.url, "asset uploaded");
                        content = replace_path(&content, &constant.path, &asset.url);
                        report.changed = true;
                        SyncStatus::Uploaded { url: asset.url }
                    }
                    Err(e) => {
                        error!(name = %constant.name, error = %e, "asset upload failed");
                        SyncStatus::Failed(e.to_string())
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %file_path.display(), "asset file not found, skipping");
                SyncStatus::Missing
            }
            Err(e) => SyncStatus::Failed(e.to_string()),
        };

        let entry = SyncEntry { constant, status };
        on_entry(&entry);
        report.entries.push(entry);
    }

    if report.changed {
        fs::write(constants_path, content).await?;
    }
    Ok(report)
}

// =============================================================================
// TESTS
// =============================================================================
