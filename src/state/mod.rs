//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `WalkerPhase`: the pagination walker's phase machine and its legal transitions
//! - `CrawlState`: page counter, gathered records and checkpoint bookkeeping

mod crawl_state;
mod walker_phase;

// Re-export main types
pub use crawl_state::CrawlState;
pub use walker_phase::WalkerPhase;
