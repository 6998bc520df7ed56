//! Crawler module for listing walks and detail fetching
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and a fixed-delay retry policy
//! - HTML extraction of item fields and file links
//! - File downloads for discovered links
//! - A bounded worker pool for per-item fetches
//! - The pagination walker that ties it all together

pub mod detail;
pub mod dispatch;
pub mod downloader;
pub mod fetcher;
pub mod navigator;
pub mod parser;
pub mod record;
pub mod retry;
pub mod walker;

pub use detail::DetailFetcher;
pub use dispatch::DispatchPool;
pub use downloader::{DownloadError, DownloadTask, FileDownloader};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage, HttpFetch, ReqwestFetcher};
pub use navigator::{HttpNavigator, PageElement, PageNavigator};
pub use parser::{Extractor, HtmlExtractor};
pub use record::{DetailRecord, ItemStub, PaperRecord, PartialRecord};
pub use retry::{RetryPolicy, TerminalFailure};
pub use walker::{build_walker, CrawlReport, PaginationWalker, StopReason};

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client, extractor and optional downloader
/// 2. Walk every listing page from the configured start URL
/// 3. Checkpoint periodically and write the final output
///
/// # Arguments
///
/// * `config` - A validated crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished and the output file was written
/// * `Err(HarvestError)` - Setup failed or progress could not be persisted
pub async fn crawl(config: &Config) -> Result<CrawlReport> {
    let mut walker = build_walker(config)?;
    walker.run().await
}
