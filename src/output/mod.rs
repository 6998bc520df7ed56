//! Output module for persisting crawl records
//!
//! This module handles:
//! - Writing record snapshots as CSV, atomically per path
//! - Periodic checkpoints and the final output file
//! - Summary statistics over gathered records

pub mod checkpoint;
pub mod csv_output;
pub mod stats;

pub use checkpoint::CheckpointStore;
pub use csv_output::{CsvRecordStore, RecordStore, CSV_COLUMNS, LIST_SEPARATOR};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
