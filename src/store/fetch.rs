//! Remote demonstration archive download.
//!
//! Published demonstration sets are distributed as gzipped tar archives,
//! one per release version. The archive is unpacked into a staging
//! directory first, so a truncated download never leaves a half-populated
//! cache behind.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tracing::info;

use crate::error::StoreError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads and unpacks a released demonstration archive.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    base_url: String,
    version: String,
}

impl ArchiveFetcher {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: version.into(),
        }
    }

    /// URL of the versioned release archive.
    pub fn archive_url(&self) -> String {
        format!(
            "{}/v{}/demonstrations.tar.gz",
            self.base_url.trim_end_matches('/'),
            self.version
        )
    }

    /// Download the release archive and unpack it into `target`.
    pub fn fetch_into(&self, target: &Path) -> Result<(), StoreError> {
        let url = self.archive_url();
        info!(url = url.as_str(), "downloading demonstration archive");

        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| StoreError::FetchFailed(e.to_string()))?;
        let response = client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| StoreError::FetchFailed(e.to_string()))?;

        unpack_archive(response, target)?;
        info!(target = %target.display(), "demonstration archive unpacked");
        Ok(())
    }
}

/// Unpack a gzipped tar stream into `target` through a staging directory.
pub(crate) fn unpack_archive(reader: impl Read, target: &Path) -> Result<(), StoreError> {
    let staging = TempDir::new()?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive
        .unpack(staging.path())
        .map_err(|e| StoreError::InvalidArchive(e.to_string()))?;
    move_tree(staging.path(), target)?;
    Ok(())
}

/// Move a directory tree, merging into existing directories. Falls back to
/// copying when the staging directory lives on another filesystem.
fn move_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            move_tree(&entry.path(), &dest)?;
        } else if fs::rename(entry.path(), &dest).is_err() {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
