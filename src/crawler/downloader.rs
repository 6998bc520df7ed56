//! File downloads for links found on item pages
//!
//! Each download streams the response body to `download_dir/<sanitized name>`
//! through a fixed-capacity buffered writer, so memory use does not grow with
//! file size. Attempts are retried with the crawl's [`RetryPolicy`].
//!
//! Destination paths are claimed for the lifetime of the downloader: when two
//! URLs sanitize to the same name the later one gets a numeric suffix, so no
//! two workers ever write the same file.

use crate::crawler::fetcher::FetchError;
use crate::crawler::retry::{RetryPolicy, TerminalFailure};
use crate::url::{filename_from_url, numbered_path};
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

/// Capacity of the write buffer between the network and the file
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// A single file transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_url: Url,
    pub destination: PathBuf,
}

/// Why a download produced no file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("invalid download URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error(transparent)]
    Exhausted(#[from] TerminalFailure),
}

/// One failed transfer attempt
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("write to {path} failed: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Streams linked files into a local directory
#[derive(Debug, Clone)]
pub struct FileDownloader {
    client: Client,
    download_dir: PathBuf,
    policy: RetryPolicy,
    timeout: Duration,
    claimed: Arc<Mutex<HashSet<PathBuf>>>,
}

impl FileDownloader {
    pub fn new(
        client: Client,
        download_dir: impl Into<PathBuf>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
            policy,
            timeout,
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Creates the download directory if needed
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.download_dir)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Downloads `url` into the download directory
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Where the file was written
    /// * `Err(DownloadError)` - The URL was unusable or every attempt failed;
    ///   a truncated file may be left behind in the latter case
    pub async fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let source_url = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let task = self.claim(source_url);

        let bytes = self
            .policy
            .attempt(url, |_| self.transfer(&task))
            .await?;

        tracing::debug!(
            "Downloaded {} ({} bytes) to {}",
            task.source_url,
            bytes,
            task.destination.display()
        );
        Ok(task.destination)
    }

    /// Picks an unclaimed destination for `source_url`
    fn claim(&self, source_url: Url) -> DownloadTask {
        let preferred = self.download_dir.join(filename_from_url(&source_url));
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());

        let mut destination = preferred.clone();
        let mut n = 1;
        while claimed.contains(&destination) {
            destination = numbered_path(&preferred, n);
            n += 1;
        }
        claimed.insert(destination.clone());

        DownloadTask {
            source_url,
            destination,
        }
    }

    /// One attempt: request, then stream the body to disk
    async fn transfer(&self, task: &DownloadTask) -> Result<u64, AttemptError> {
        let url = task.source_url.as_str();
        let mut response = self
            .client
            .get(task.source_url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let write_error = |source: std::io::Error| AttemptError::Write {
            path: task.destination.display().to_string(),
            source,
        };

        let file = File::create(&task.destination).await.map_err(write_error)?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut written = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
        {
            writer.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }

        writer.flush().await.map_err(write_error)?;
        Ok(written)
    }
}
