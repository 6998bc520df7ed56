//! Statistics over gathered paper records
//!
//! Computed either from the records of a finished crawl or from a CSV file
//! written by an earlier one.

use crate::crawler::record::ABSTRACT_NOT_FOUND;
use crate::crawler::PaperRecord;
use crate::output::csv_output::{CsvRecordStore, RecordStore};
use crate::Result;
use std::path::Path;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of records
    pub total_records: usize,

    /// Records whose item page could not be fetched or had download errors
    pub failed_records: usize,

    /// Records with an extracted abstract
    pub with_abstract: usize,

    /// Records with at least one download link
    pub with_download_links: usize,

    /// Download links across all records
    pub total_download_links: usize,

    /// Files written to disk across all records
    pub files_downloaded: usize,
}

impl CrawlStatistics {
    pub fn from_records(records: &[PaperRecord]) -> Self {
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            if record.error.is_some() {
                stats.failed_records += 1;
            }
            if record.abstract_text != ABSTRACT_NOT_FOUND {
                stats.with_abstract += 1;
            }
            if !record.download_links.is_empty() {
                stats.with_download_links += 1;
            }
            stats.total_download_links += record.file_count;
            stats.files_downloaded += record.downloaded_files.len();
        }

        stats
    }

    /// Share of records without an error, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        let ok = self.total_records - self.failed_records;
        (ok as f64 / self.total_records as f64) * 100.0
    }
}

/// Loads statistics from a records CSV
pub fn load_statistics(path: &Path) -> Result<CrawlStatistics> {
    let records = CsvRecordStore::new().read_records(path)?;
    Ok(CrawlStatistics::from_records(&records))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Records with errors: {}", stats.failed_records);
    println!("  Records with abstract: {}", stats.with_abstract);
    println!();

    println!("Files:");
    println!(
        "  Records with download links: {}",
        stats.with_download_links
    );
    println!("  Download links found: {}", stats.total_download_links);
    println!("  Files downloaded: {}", stats.files_downloaded);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} records without errors)",
        stats.success_rate(),
        stats.total_records - stats.failed_records,
        stats.total_records
    );
}
