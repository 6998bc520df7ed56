//! Per-item detail fetching
//!
//! [`DetailFetcher::fetch_detail`] never fails: whatever happens on the network,
//! the caller gets a [`DetailRecord`], with sentinel fields and an error marker
//! when the item page could not be fetched.

use crate::config::Config;
use crate::crawler::downloader::FileDownloader;
use crate::crawler::fetcher::HttpFetch;
use crate::crawler::parser::Extractor;
use crate::crawler::record::DetailRecord;
use crate::crawler::retry::RetryPolicy;
use crate::url::has_allowed_extension;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Turns item URLs into detail records
pub struct DetailFetcher {
    fetcher: Arc<dyn HttpFetch>,
    extractor: Arc<dyn Extractor>,
    policy: RetryPolicy,
    request_timeout: Duration,
    allowed_extensions: Vec<String>,
    downloader: Option<FileDownloader>,
}

impl DetailFetcher {
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        extractor: Arc<dyn Extractor>,
        policy: RetryPolicy,
        request_timeout: Duration,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            policy,
            request_timeout,
            allowed_extensions,
            downloader: None,
        }
    }

    /// Builds a fetcher using the crawl configuration's retry and extension settings
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn HttpFetch>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self::new(
            fetcher,
            extractor,
            RetryPolicy::from_config(&config.crawler),
            config.crawler.request_timeout(),
            config.extraction.allowed_extensions.clone(),
        )
    }

    /// Downloads every discovered file link after a successful fetch
    pub fn with_downloader(mut self, downloader: FileDownloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Fetches an item page and extracts its detail record
    ///
    /// 1. Fetch with retries; on terminal failure return [`DetailRecord::failed`]
    /// 2. Extract fields and keep allow-listed file links, deduplicated in page order
    /// 3. If downloading is enabled, download each link and record failures in `error`
    pub async fn fetch_detail(&self, url: &str) -> DetailRecord {
        let page = match self
            .policy
            .attempt(url, |_| self.fetcher.get(url, self.request_timeout))
            .await
        {
            Ok(page) => page,
            Err(failure) => {
                tracing::warn!("Giving up on {}: {}", url, failure);
                return DetailRecord::failed();
            }
        };

        let page_url = match Url::parse(&page.final_url) {
            Ok(u) => u,
            Err(e) => {
                return DetailRecord::failed_with(format!(
                    "Invalid page URL {}: {}",
                    page.final_url, e
                ))
            }
        };

        let partial = self.extractor.extract(&page.body, &page_url);
        let download_links = self.filter_links(&partial.links);
        let mut record = DetailRecord::from_partial(partial, download_links);

        if let Some(downloader) = &self.downloader {
            self.download_all(downloader, &mut record).await;
        }

        record
    }

    fn filter_links(&self, links: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for link in links {
            let allowed = Url::parse(link)
                .map(|u| has_allowed_extension(&u, &self.allowed_extensions))
                .unwrap_or(false);

            if allowed && seen.insert(link.clone()) {
                kept.push(link.clone());
            }
        }

        kept
    }

    async fn download_all(&self, downloader: &FileDownloader, record: &mut DetailRecord) {
        let mut failures = Vec::new();

        for link in &record.download_links {
            match downloader.download(link).await {
                Ok(path) => record.downloaded_files.push(path.display().to_string()),
                Err(e) => {
                    tracing::warn!("Download failed for {}: {}", link, e);
                    failures.push(format!("{}: {}", link, e));
                }
            }
        }

        if !failures.is_empty() {
            record.error = Some(failures.join("; "));
        }
    }
}
