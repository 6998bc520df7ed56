//! Pagination walker - main crawl orchestration logic
//!
//! This module drives the crawl one listing page at a time:
//! - Waiting for the listing page to load
//! - Pairing item titles with item links
//! - Fanning detail fetches out to the dispatch pool
//! - Periodic checkpoints and the final flush
//! - Following the "next page" control until it disappears
//!
//! The walker is strictly sequential; the only parallel region is inside
//! [`DispatchPool::dispatch`].

use crate::config::{Config, CrawlerConfig, ExtractionConfig};
use crate::crawler::detail::DetailFetcher;
use crate::crawler::dispatch::DispatchPool;
use crate::crawler::downloader::FileDownloader;
use crate::crawler::fetcher::{HttpFetch, ReqwestFetcher};
use crate::crawler::navigator::{HttpNavigator, PageNavigator};
use crate::crawler::parser::HtmlExtractor;
use crate::crawler::record::{ItemStub, PaperRecord};
use crate::crawler::retry::RetryPolicy;
use crate::output::CheckpointStore;
use crate::state::{CrawlState, WalkerPhase};
use crate::url::is_excluded_link;
use crate::{HarvestError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Why the walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No further "next page" control, or the page limit was reached
    Completed,

    /// A listing page never showed its content marker
    PageLoadTimeout,
}

/// Outcome of a finished walk
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Listing pages that loaded and were processed
    pub pages_visited: u32,

    /// Records written to the final output
    pub records: usize,

    /// Records carrying an error marker
    pub failed_records: usize,

    pub checkpoints_written: u32,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Walks a paginated listing, one page at a time
pub struct PaginationWalker<N: PageNavigator> {
    crawler: CrawlerConfig,
    extraction: ExtractionConfig,
    navigator: N,
    pool: DispatchPool,
    store: CheckpointStore,
    state: CrawlState,
    phase: WalkerPhase,
}

impl<N: PageNavigator> PaginationWalker<N> {
    pub fn new(config: &Config, navigator: N, pool: DispatchPool, store: CheckpointStore) -> Self {
        Self {
            crawler: config.crawler.clone(),
            extraction: config.extraction.clone(),
            navigator,
            pool,
            store,
            state: CrawlState::new(),
            phase: WalkerPhase::Loading,
        }
    }

    pub fn phase(&self) -> WalkerPhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the walk to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The walk ended and the final output was written,
    ///   including after a page-load timeout
    /// * `Err(HarvestError)` - A checkpoint or the final output could not be
    ///   written, or the start URL could not be loaded
    pub async fn run(&mut self) -> Result<CrawlReport> {
        let started_at = Utc::now();
        let mut stop_reason = StopReason::Completed;
        let mut pages_visited = 0u32;
        let mut stubs: Vec<ItemStub> = Vec::new();

        tracing::info!(
            "Starting crawl at {} with {} workers",
            self.crawler.start_url,
            self.pool.width()
        );
        self.navigator.load(&self.crawler.start_url).await?;

        while !self.phase.is_terminal() {
            match self.phase {
                WalkerPhase::Loading => {
                    let loaded = self
                        .navigator
                        .wait_until_present(
                            &self.extraction.listing_marker,
                            self.crawler.page_load_timeout(),
                        )
                        .await;

                    if loaded {
                        self.transition(WalkerPhase::Ready)?;
                    } else {
                        tracing::warn!(
                            "Page {} did not load within {:?}, stopping",
                            self.state.current_page,
                            self.crawler.page_load_timeout()
                        );
                        stop_reason = StopReason::PageLoadTimeout;
                        self.transition(WalkerPhase::Failed)?;
                    }
                }

                WalkerPhase::Ready => {
                    pages_visited += 1;
                    tracing::info!("Processing page {}", self.state.current_page);
                    self.transition(WalkerPhase::Extracting)?;
                }

                WalkerPhase::Extracting => {
                    stubs = self.extract_stubs();
                    tracing::info!(
                        "Found {} items on page {}",
                        stubs.len(),
                        self.state.current_page
                    );
                    self.transition(WalkerPhase::Dispatching)?;
                }

                WalkerPhase::Dispatching => {
                    let page_stubs = std::mem::take(&mut stubs);
                    self.process_page(page_stubs).await?;
                    self.transition(WalkerPhase::Paginating)?;
                }

                WalkerPhase::Paginating => {
                    let next = self.advance().await;
                    self.transition(next)?;
                }

                WalkerPhase::Failed => {
                    self.transition(WalkerPhase::Done)?;
                }

                WalkerPhase::Done => {}
            }
        }

        self.store.flush_final(&self.state.records)?;

        let report = CrawlReport {
            pages_visited,
            records: self.state.records.len(),
            failed_records: self.state.failed_records(),
            checkpoints_written: self.store.checkpoints_written(),
            stop_reason,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Crawl finished: {} records from {} pages ({} with errors)",
            report.records,
            report.pages_visited,
            report.failed_records
        );

        Ok(report)
    }

    fn transition(&mut self, next: WalkerPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Walker {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Pairs titles and links on the current page into stubs
    ///
    /// A link seen twice keeps its first position and takes the later title.
    fn extract_stubs(&self) -> Vec<ItemStub> {
        let titles = self.navigator.find_all(&self.extraction.item_title_selector);
        let links = self.navigator.find_all(&self.extraction.item_link_selector);

        let mut stubs: Vec<ItemStub> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (title_element, link_element) in titles.iter().zip(links.iter()) {
            let title = title_element.text.trim();
            let link = match link_element.href.as_deref() {
                Some(href) if !href.trim().is_empty() => href.trim(),
                _ => continue,
            };

            if title.is_empty() || is_excluded_link(link, &self.extraction.excluded_link_marker) {
                continue;
            }

            match positions.get(link) {
                Some(&index) => stubs[index].title = title.to_string(),
                None => {
                    positions.insert(link.to_string(), stubs.len());
                    stubs.push(ItemStub::new(title, link));
                }
            }
        }

        stubs
    }

    /// Fetches details for one page's stubs and stores the merged records
    async fn process_page(&mut self, stubs: Vec<ItemStub>) -> Result<()> {
        let links: Vec<String> = stubs.iter().map(|s| s.link.clone()).collect();
        let details = self.pool.dispatch(&links).await;

        let records: Vec<PaperRecord> = stubs
            .into_iter()
            .zip(details)
            .map(|(stub, detail)| PaperRecord::merge(stub, detail))
            .collect();

        self.state.complete_page(records);

        if self.state.checkpoint_due(self.crawler.save_interval_pages) {
            self.store.flush_checkpoint(&self.state.records)?;
            self.state.reset_checkpoint_counter();
        }

        Ok(())
    }

    /// Moves to the next listing page, if there is one
    ///
    /// Returns the phase to enter: `Loading` after following the next-page
    /// control, `Done` otherwise.
    async fn advance(&mut self) -> WalkerPhase {
        let finished_page = self.state.current_page;
        self.state.advance_page();

        if let Some(max_pages) = self.crawler.max_pages {
            if finished_page >= max_pages {
                tracing::info!("Reached page limit of {}", max_pages);
                return WalkerPhase::Done;
            }
        }

        let next = self
            .navigator
            .find_one(
                &self.extraction.next_page_selector,
                self.crawler.next_control_timeout(),
            )
            .await;

        let element = match next {
            Some(element) if element.is_clickable() => element,
            _ => {
                tracing::info!("No next page after page {}", finished_page);
                return WalkerPhase::Done;
            }
        };

        if let Err(e) = self.navigator.click(&element).await {
            tracing::warn!("Could not follow next page control: {}", e);
            return WalkerPhase::Done;
        }

        tracing::debug!(
            "Moved to page {}, waiting {:?}",
            self.state.current_page,
            self.crawler.crawl_delay()
        );
        tokio::time::sleep(self.crawler.crawl_delay()).await;
        WalkerPhase::Loading
    }
}

/// Builds a walker over plain HTTP from a validated configuration
///
/// Creates the download directory when downloads are enabled; failing to
/// create it is fatal.
pub fn build_walker(config: &Config) -> Result<PaginationWalker<HttpNavigator>> {
    let reqwest_fetcher = ReqwestFetcher::from_config(&config.user_agent)?;
    let client = reqwest_fetcher.client().clone();
    let fetcher: Arc<dyn HttpFetch> = Arc::new(reqwest_fetcher);
    let extractor = Arc::new(HtmlExtractor::new(&config.extraction)?);

    let mut detail = DetailFetcher::from_config(config, Arc::clone(&fetcher), extractor);

    if config.output.download_files {
        let downloader = FileDownloader::new(
            client,
            &config.output.download_dir,
            RetryPolicy::from_config(&config.crawler),
            config.crawler.download_timeout(),
        );
        downloader.prepare()?;
        tracing::info!("Downloading files to {}", downloader.download_dir().display());
        detail = detail.with_downloader(downloader);
    }

    let pool = DispatchPool::new(Arc::new(detail), config.crawler.worker_count);
    let navigator = HttpNavigator::new(
        fetcher,
        config.crawler.request_timeout(),
        config.crawler.poll_interval(),
    );
    let store = CheckpointStore::from_config(&config.output);

    Ok(PaginationWalker::new(config, navigator, pool, store))
}
