//! Periodic and final persistence of crawl records

use crate::config::OutputConfig;
use crate::crawler::PaperRecord;
use crate::output::csv_output::{CsvRecordStore, RecordStore};
use crate::Result;
use std::path::{Path, PathBuf};

/// Writes record snapshots to the checkpoint and final output paths
pub struct CheckpointStore {
    store: Box<dyn RecordStore>,
    output_path: PathBuf,
    checkpoint_path: PathBuf,
    checkpoints_written: u32,
}

impl CheckpointStore {
    /// Creates a CSV-backed store
    pub fn new(output_path: impl Into<PathBuf>, checkpoint_path: impl Into<PathBuf>) -> Self {
        Self::with_store(Box::new(CsvRecordStore::new()), output_path, checkpoint_path)
    }

    pub fn with_store(
        store: Box<dyn RecordStore>,
        output_path: impl Into<PathBuf>,
        checkpoint_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            output_path: output_path.into(),
            checkpoint_path: checkpoint_path.into(),
            checkpoints_written: 0,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.output_path, &config.checkpoint_path)
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn checkpoints_written(&self) -> u32 {
        self.checkpoints_written
    }

    /// Writes every record gathered so far to the checkpoint path
    pub fn flush_checkpoint(&mut self, records: &[PaperRecord]) -> Result<()> {
        self.store.write_snapshot(&self.checkpoint_path, records)?;
        self.checkpoints_written += 1;
        tracing::info!(
            "Checkpoint saved: {} records to {}",
            records.len(),
            self.checkpoint_path.display()
        );
        Ok(())
    }

    /// Writes every record to the final output path
    pub fn flush_final(&self, records: &[PaperRecord]) -> Result<()> {
        self.store.write_snapshot(&self.output_path, records)?;
        tracing::info!(
            "Saved {} records to {}",
            records.len(),
            self.output_path.display()
        );
        Ok(())
    }
}
