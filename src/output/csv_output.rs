//! CSV persistence for paper records
//!
//! Every write is a full snapshot of the records gathered so far. The snapshot
//! goes to `<path>.tmp` first and is renamed over `path`, so readers never see
//! a half-written file.

use crate::crawler::PaperRecord;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Column headers, in output order
pub const CSV_COLUMNS: [&str; 9] = [
    "Title",
    "Link",
    "Download Links",
    "Date Published",
    "Authors",
    "Abstract",
    "Downloaded Files",
    "Files Count",
    "Download Errors",
];

/// Separator for list-valued columns
pub const LIST_SEPARATOR: &str = "; ";

/// Trait for record persistence backends
pub trait RecordStore: Send + Sync {
    /// Replaces the contents of `path` with `records`
    fn write_snapshot(&self, path: &Path, records: &[PaperRecord]) -> Result<()>;

    /// Reads back a snapshot written by [`RecordStore::write_snapshot`]
    fn read_records(&self, path: &Path) -> Result<Vec<PaperRecord>>;
}

/// One CSV row; field order matches [`CSV_COLUMNS`]
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Link")]
    link: String,
    #[serde(rename = "Download Links")]
    download_links: String,
    #[serde(rename = "Date Published")]
    date_published: String,
    #[serde(rename = "Authors")]
    authors: String,
    #[serde(rename = "Abstract")]
    abstract_text: String,
    #[serde(rename = "Downloaded Files")]
    downloaded_files: String,
    #[serde(rename = "Files Count")]
    file_count: usize,
    #[serde(rename = "Download Errors")]
    error: String,
}

impl From<&PaperRecord> for CsvRow {
    fn from(record: &PaperRecord) -> Self {
        Self {
            title: record.title.clone(),
            link: record.link.clone(),
            download_links: record.download_links.join(LIST_SEPARATOR),
            date_published: record.date_published.clone(),
            authors: record.authors.clone(),
            abstract_text: record.abstract_text.clone(),
            downloaded_files: record.downloaded_files.join(LIST_SEPARATOR),
            file_count: record.file_count,
            error: record.error.clone().unwrap_or_default(),
        }
    }
}

impl From<CsvRow> for PaperRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            title: row.title,
            link: row.link,
            download_links: split_list(&row.download_links),
            date_published: row.date_published,
            authors: row.authors,
            abstract_text: row.abstract_text,
            downloaded_files: split_list(&row.downloaded_files),
            file_count: row.file_count,
            error: Some(row.error).filter(|e| !e.is_empty()),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(LIST_SEPARATOR).map(str::to_string).collect()
}

/// `<path>.tmp`, keeping the original extension
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// [`RecordStore`] writing comma-separated files with a header row
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRecordStore;

impl CsvRecordStore {
    pub fn new() -> Self {
        Self
    }
}

impl RecordStore for CsvRecordStore {
    fn write_snapshot(&self, path: &Path, records: &[PaperRecord]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = temp_path(path);
        {
            // Header written explicitly so an empty snapshot still has one
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)?;
            writer.write_record(CSV_COLUMNS)?;
            for record in records {
                writer.serialize(CsvRow::from(record))?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;

        tracing::debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }

    fn read_records(&self, path: &Path) -> Result<Vec<PaperRecord>> {
        let mut reader = csv::ReaderBuilder::new().from_path(path)?;
        let mut records = Vec::new();

        for row in reader.deserialize::<CsvRow>() {
            records.push(PaperRecord::from(row?));
        }

        Ok(records)
    }
}
