//! Record types flowing through the crawl pipeline
//!
//! Stubs come off listing pages, detail records come back from item pages, and
//! the two are merged positionally into the rows that get persisted.

/// Title used when an item page has no recognisable title
pub const TITLE_NOT_FOUND: &str = "Title Not Found";

/// Date or authors that could not be determined
pub const UNKNOWN: &str = "Unknown";

/// Abstract that could not be determined
pub const ABSTRACT_NOT_FOUND: &str = "Abstract not found";

/// Error marker for an item page that failed every fetch attempt
pub const FAILED_AFTER_RETRIES: &str = "Failed after retries";

/// Minimal identity of an item, as discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStub {
    /// Provisional title, superseded by the detail record's title
    pub title: String,

    /// Absolute URL of the item page; unique within a page
    pub link: String,
}

impl ItemStub {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Fields an extractor managed to read off an item page
///
/// Every field is optional; sentinels are applied when the partial record is
/// turned into a [`DetailRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub title: Option<String>,

    /// Absolute URLs of every link on the page; filtered by the fetcher
    pub links: Vec<String>,

    pub date_published: Option<String>,
    pub authors: Option<String>,
    pub abstract_text: Option<String>,
}

/// Everything known about an item after visiting its own page
///
/// Fields are never absent: anything that could not be determined holds a
/// sentinel, and `error` says whether the page was fetched at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    pub title: String,
    pub download_links: Vec<String>,
    pub date_published: String,
    pub authors: String,
    pub abstract_text: String,
    pub downloaded_files: Vec<String>,
    pub file_count: usize,
    pub error: Option<String>,
}

impl Default for DetailRecord {
    fn default() -> Self {
        Self {
            title: TITLE_NOT_FOUND.to_string(),
            download_links: Vec::new(),
            date_published: UNKNOWN.to_string(),
            authors: UNKNOWN.to_string(),
            abstract_text: ABSTRACT_NOT_FOUND.to_string(),
            downloaded_files: Vec::new(),
            file_count: 0,
            error: None,
        }
    }
}

impl DetailRecord {
    /// Record for an item page that could not be fetched
    pub fn failed() -> Self {
        Self::failed_with(FAILED_AFTER_RETRIES)
    }

    /// Sentinel record carrying a specific error
    pub fn failed_with(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Builds a record from extracted fields and the already-filtered download links
    pub fn from_partial(partial: PartialRecord, download_links: Vec<String>) -> Self {
        let defaults = Self::default();
        Self {
            title: non_empty(partial.title).unwrap_or(defaults.title),
            file_count: download_links.len(),
            download_links,
            date_published: non_empty(partial.date_published).unwrap_or(defaults.date_published),
            authors: non_empty(partial.authors).unwrap_or(defaults.authors),
            abstract_text: non_empty(partial.abstract_text).unwrap_or(defaults.abstract_text),
            downloaded_files: Vec::new(),
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One persisted row: an item's link merged with its detail record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperRecord {
    pub title: String,
    pub link: String,
    pub download_links: Vec<String>,
    pub date_published: String,
    pub authors: String,
    pub abstract_text: String,
    pub downloaded_files: Vec<String>,
    pub file_count: usize,
    pub error: Option<String>,
}

impl PaperRecord {
    /// Merges a stub with the detail record fetched for it
    ///
    /// The detail page's title replaces the provisional listing title.
    pub fn merge(stub: ItemStub, detail: DetailRecord) -> Self {
        Self {
            title: detail.title,
            link: stub.link,
            download_links: detail.download_links,
            date_published: detail.date_published,
            authors: detail.authors,
            abstract_text: detail.abstract_text,
            downloaded_files: detail.downloaded_files,
            file_count: detail.file_count,
            error: detail.error,
        }
    }
}
