//! Filing downloads
//!
//! Documents are stored under the output directory with a name derived from
//! the SHA-256 of their URL, so the same filing always lands at the same path.
//! Bytes are written to a hidden `.part` file first and renamed into place,
//! which leaves no partial document behind when a write fails.

use crate::session::IapdSession;
use crate::{IapdError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// What to do when the target file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingFilePolicy {
    /// Fetch again and replace the file
    #[default]
    Overwrite,

    /// Keep a non-empty existing file and skip the request
    Skip,
}

/// Directory used when the caller gives none
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("iapd-filings")
}

/// File name for a document URL: hex SHA-256 of the URL plus `.pdf`
pub fn file_name_for(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{}.pdf", hex::encode(hasher.finalize()))
}

/// Downloads `url` into `output_dir` and returns the saved path
///
/// The directory is created if missing. An empty response body is treated
/// as a failed download.
pub async fn download_form(
    session: &IapdSession,
    url: &str,
    output_dir: &Path,
    policy: ExistingFilePolicy,
) -> Result<PathBuf> {
    let local_path = output_dir.join(file_name_for(url));

    if policy == ExistingFilePolicy::Skip && is_non_empty_file(&local_path).await {
        tracing::debug!("Keeping existing file: {}", local_path.display());
        return Ok(local_path);
    }

    let response = session.get(url).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| IapdError::from_reqwest(url, e))?;

    if bytes.is_empty() {
        return Err(IapdError::UnexpectedResponse {
            url: url.to_string(),
            message: "empty document".to_string(),
        });
    }

    write_atomic(&local_path, &bytes).await?;
    tracing::debug!("Downloaded file: {}", local_path.display());
    Ok(local_path)
}

/// Writes `bytes` to `path` through a temporary sibling file
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| IapdError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let part_path = dir.join(format!(".{}.part", file_name));

    let written = async {
        tokio::fs::write(&part_path, bytes).await?;
        tokio::fs::rename(&part_path, path).await
    }
    .await;

    if let Err(source) = written {
        if let Err(e) = tokio::fs::remove_file(&part_path).await {
            tracing::debug!("Could not remove {}: {}", part_path.display(), e);
        }
        return Err(IapdError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

async fn is_non_empty_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
