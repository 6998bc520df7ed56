use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Paper-Harvest
///
/// Every section carries defaults, so an empty TOML file describes a crawl of
/// the Census Bureau working-papers catalog with link collection only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub extraction: ExtractionConfig,
}

/// Crawl pacing, concurrency and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// First listing page of the catalog
    pub start_url: String,

    /// Width of the per-page detail fetch pool
    pub worker_count: usize,

    /// Flush a checkpoint after this many listing pages
    pub save_interval_pages: u32,

    /// Politeness delay after advancing to the next listing page (milliseconds)
    pub crawl_delay_ms: u64,

    /// Attempts per fetch or download, including the first
    pub retry_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Per-request timeout for listing and item pages (seconds)
    pub request_timeout_secs: u64,

    /// Total time allowed for one file download attempt (seconds)
    pub download_timeout_secs: u64,

    /// How long to wait for the listing marker before giving up (seconds)
    pub page_load_timeout_secs: u64,

    /// How long to look for the "next page" control (milliseconds)
    pub next_control_timeout_ms: u64,

    /// Interval between page polls while waiting for markers (milliseconds)
    pub poll_interval_ms: u64,

    /// Stop after this many listing pages
    pub max_pages: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: "https://www.census.gov/library/working-papers.html".to_string(),
            worker_count: 10,
            save_interval_pages: 10,
            crawl_delay_ms: 4_000,
            retry_attempts: 3,
            retry_delay_ms: 2_000,
            request_timeout_secs: 5,
            download_timeout_secs: 300,
            page_load_timeout_secs: 5,
            next_control_timeout_ms: 5_000,
            poll_interval_ms: 500,
            max_pages: None,
        }
    }
}

impl CrawlerConfig {
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn next_control_timeout(&self) -> Duration {
        Duration::from_millis(self.next_control_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Mozilla".to_string(),
            crawler_version: "5.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the CSV written when the crawl finishes
    pub output_path: String,

    /// Path of the periodic checkpoint CSV
    pub checkpoint_path: String,

    /// Directory receiving downloaded files
    pub download_dir: String,

    /// Download linked files instead of only collecting their links
    pub download_files: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "working_papers_complete.csv".to_string(),
            checkpoint_path: "temp_output.csv".to_string(),
            download_dir: "downloads".to_string(),
            download_files: false,
        }
    }
}

/// Site layout description: every selector the crawl depends on
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    /// Element whose presence marks a fully loaded listing page
    pub listing_marker: String,

    /// Item titles on a listing page
    pub item_title_selector: String,

    /// Item links on a listing page, paired positionally with titles
    pub item_link_selector: String,

    /// Links containing this text point at index pages, not items
    pub excluded_link_marker: String,

    /// The "next page" control on a listing page
    pub next_page_selector: String,

    /// Title on an item page
    pub title_selector: String,

    /// Publication date on an item page
    pub date_selector: String,

    /// Authors on an item page
    pub author_selector: String,

    /// Abstract containers on an item page, in priority order
    pub abstract_selectors: Vec<String>,

    /// Paragraph fallback for the abstract must be longer than this
    pub min_paragraph_chars: usize,

    /// File extensions worth collecting as download links
    pub allowed_extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            listing_marker: ".uscb-default-x-column-title".to_string(),
            item_title_selector: ".uscb-default-x-column-title".to_string(),
            item_link_selector: "a[href*='/library/working-papers/']".to_string(),
            excluded_link_marker: "series.html".to_string(),
            next_page_selector: ".nextButton".to_string(),
            title_selector: "h1.cmp-title__text".to_string(),
            date_selector: "time[itemprop='datePublished']".to_string(),
            author_selector: "div[itemprop='author']".to_string(),
            abstract_selectors: vec![
                "div.uscb-text-image-text".to_string(),
                "div.cmp-text".to_string(),
            ],
            min_paragraph_chars: 50,
            allowed_extensions: ["pdf", "xlsx", "xls", "csv", "docx", "zip"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}
