//! Crawl state owned by the pagination walker
//!
//! Holds the page counter, the records gathered so far and the number of pages
//! since the last checkpoint. Only the walker touches it, and only between
//! phases, so no locking is involved.

use crate::crawler::PaperRecord;

/// Progress of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// 1-based number of the listing page being processed
    pub current_page: u32,

    /// Every record gathered so far, in stub discovery order
    pub records: Vec<PaperRecord>,

    /// Pages completed since the last checkpoint flush
    pub pages_since_checkpoint: u32,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            records: Vec::new(),
            pages_since_checkpoint: 0,
        }
    }

    /// Appends one page's records and counts the page toward the next checkpoint
    pub fn complete_page(&mut self, page_records: Vec<PaperRecord>) {
        self.records.extend(page_records);
        self.pages_since_checkpoint += 1;
    }

    /// Returns true once `interval` pages have completed since the last flush
    pub fn checkpoint_due(&self, interval: u32) -> bool {
        interval > 0 && self.pages_since_checkpoint >= interval
    }

    pub fn reset_checkpoint_counter(&mut self) {
        self.pages_since_checkpoint = 0;
    }

    pub fn advance_page(&mut self) {
        self.current_page += 1;
    }

    /// Number of gathered records that carry an error
    pub fn failed_records(&self) -> usize {
        self.records.iter().filter(|r| r.error.is_some()).count()
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{DetailRecord, ItemStub};

    fn record(n: u32) -> PaperRecord {
        let stub = ItemStub::new(format!("Paper {}", n), format!("https://example.com/{}", n));
        PaperRecord::merge(stub, DetailRecord::default())
    }

    #[test]
    fn test_new_state() {
        let state = CrawlState::new();
        assert_eq!(state.current_page, 1);
        assert!(state.records.is_empty());
        assert_eq!(state.pages_since_checkpoint, 0);
    }

    #[test]
    fn test_checkpoint_due_every_interval() {
        let mut state = CrawlState::new();
        let mut flushes = 0;

        for page in 1..=5 {
            state.complete_page(vec![record(page)]);
            if state.checkpoint_due(2) {
                flushes += 1;
                state.reset_checkpoint_counter();
            }
            state.advance_page();
        }

        assert_eq!(flushes, 2);
        assert_eq!(state.records.len(), 5);
        assert_eq!(state.pages_since_checkpoint, 1);
        assert_eq!(state.current_page, 6);
    }

    #[test]
    fn test_failed_records() {
        let mut state = CrawlState::new();
        let stub = ItemStub::new("Broken", "https://example.com/broken");
        state.complete_page(vec![
            record(1),
            PaperRecord::merge(stub, DetailRecord::failed()),
        ]);
        assert_eq!(state.failed_records(), 1);
    }
}
