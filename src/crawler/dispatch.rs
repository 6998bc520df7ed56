//! Bounded worker pool for detail fetches
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - One worker task per item, spawned only once a permit is held
//! - Realigning results to submission order
//! - Containing worker panics to their own slot

use crate::crawler::detail::DetailFetcher;
use crate::crawler::record::DetailRecord;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Error marker for a slot whose worker task died
pub const WORKER_FAILED: &str = "Worker task failed";

/// A submitted item: either running or already settled
enum Slot {
    Running(JoinHandle<DetailRecord>),
    Settled(DetailRecord),
}

/// Fixed-width fan-out of detail fetches
///
/// At most `width` fetches are outstanding at any instant. Items beyond that
/// wait for a permit before their worker is spawned.
pub struct DispatchPool {
    fetcher: Arc<DetailFetcher>,
    semaphore: Arc<Semaphore>,
    width: usize,
}

impl DispatchPool {
    /// Creates a pool of the given width (at least one)
    pub fn new(fetcher: Arc<DetailFetcher>, width: usize) -> Self {
        let width = width.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    /// Maximum number of fetches in flight
    pub fn width(&self) -> usize {
        self.width
    }

    /// Fetches detail records for `links`
    ///
    /// # Returns
    ///
    /// Exactly one record per link, in the same order as `links`, regardless
    /// of the order in which workers finish.
    pub async fn dispatch(&self, links: &[String]) -> Vec<DetailRecord> {
        let mut slots = Vec::with_capacity(links.len());

        for link in links {
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Dispatch pool closed before {}: {}", link, e);
                    slots.push(Slot::Settled(DetailRecord::failed_with(WORKER_FAILED)));
                    continue;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let link = link.clone();
            slots.push(Slot::Running(tokio::spawn(async move {
                let _permit = permit;
                fetcher.fetch_detail(&link).await
            })));
        }

        let mut records = Vec::with_capacity(slots.len());
        for (link, slot) in links.iter().zip(slots) {
            let record = match slot {
                Slot::Settled(record) => record,
                Slot::Running(handle) => match handle.await {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::error!("Worker for {} failed: {}", link, e);
                        DetailRecord::failed_with(WORKER_FAILED)
                    }
                },
            };
            records.push(record);
        }

        records
    }
}
