//! Paper-Harvest main entry point
//!
//! This is the command-line interface for the Paper-Harvest catalog crawler.

use anyhow::Context;
use clap::Parser;
use paper_harvest::config::{load_config_with_hash, validate, Config};
use paper_harvest::crawler::{crawl, StopReason};
use paper_harvest::output::{load_statistics, print_statistics};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Paper-Harvest: a checkpointing crawler for paginated document catalogs
///
/// Walks every listing page from the start URL, fetches each item's page
/// for its details, optionally downloads linked files, and writes the
/// records to CSV with periodic checkpoints.
#[derive(Parser, Debug)]
#[command(name = "paper-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A checkpointing crawler for paginated document catalogs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First listing page to crawl
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Download files linked from item pages
    #[arg(long)]
    download_files: bool,

    /// Write a checkpoint every N listing pages
    #[arg(long, value_name = "PAGES")]
    save_interval: Option<u32>,

    /// Final output CSV
    #[arg(long, value_name = "PATH")]
    output_csv: Option<String>,

    /// Checkpoint CSV
    #[arg(long, value_name = "PATH")]
    temp_csv: Option<String>,

    /// Directory for downloaded files
    #[arg(long, value_name = "DIR")]
    download_dir: Option<String>,

    /// Attempts per fetch or download, including the first
    #[arg(long, value_name = "N")]
    retry_attempts: Option<u32>,

    /// Concurrent detail fetches per listing page
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Stop after this many listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for an existing output CSV and exit
    #[arg(long, value_name = "CSV", conflicts_with = "dry_run")]
    stats: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.start_url {
            config.crawler.start_url = url.clone();
        }
        if self.download_files {
            config.output.download_files = true;
        }
        if let Some(interval) = self.save_interval {
            config.crawler.save_interval_pages = interval;
        }
        if let Some(path) = &self.output_csv {
            config.output.output_path = path.clone();
        }
        if let Some(path) = &self.temp_csv {
            config.output.checkpoint_path = path.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.output.download_dir = dir.clone();
        }
        if let Some(attempts) = self.retry_attempts {
            config.crawler.retry_attempts = attempts;
        }
        if let Some(workers) = self.workers {
            config.crawler.worker_count = workers;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = Some(max_pages);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.stats {
        return handle_stats(path);
    }

    let config = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paper_harvest=info,warn"),
            1 => EnvFilter::new("paper_harvest=debug,info"),
            2 => EnvFilter::new("paper_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any), applies CLI overrides and validates the result
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Paper-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Workers: {}", config.crawler.worker_count);
    println!("  Save interval: {} pages", config.crawler.save_interval_pages);
    println!("  Crawl delay: {}ms", config.crawler.crawl_delay_ms);
    println!(
        "  Retries: {} attempts, {}ms apart",
        config.crawler.retry_attempts, config.crawler.retry_delay_ms
    );
    match config.crawler.max_pages {
        Some(n) => println!("  Max pages: {}", n),
        None => println!("  Max pages: unlimited"),
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Output CSV: {}", config.output.output_path);
    println!("  Checkpoint CSV: {}", config.output.checkpoint_path);
    if config.output.download_files {
        println!("  Downloads: {}", config.output.download_dir);
    } else {
        println!("  Downloads: disabled");
    }

    println!("\nExtraction:");
    println!("  Listing marker: {}", config.extraction.listing_marker);
    println!("  Item titles: {}", config.extraction.item_title_selector);
    println!("  Item links: {}", config.extraction.item_link_selector);
    println!("  Next page: {}", config.extraction.next_page_selector);
    println!(
        "  File types: {}",
        config.extraction.allowed_extensions.join(", ")
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarises an existing output file
fn handle_stats(path: &Path) -> anyhow::Result<()> {
    println!("Records: {}\n", path.display());

    let stats = load_statistics(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Workers: {}, save interval: {} pages, downloads: {}",
        config.crawler.worker_count,
        config.crawler.save_interval_pages,
        if config.output.download_files { "on" } else { "off" }
    );

    let report = match crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e).context("Crawl aborted");
        }
    };

    if report.stop_reason == StopReason::PageLoadTimeout {
        tracing::warn!("Stopped early: a listing page did not load in time");
    }

    tracing::info!(
        "Crawl completed in {}s: {} pages, {} checkpoints",
        report.duration_seconds(),
        report.pages_visited,
        report.checkpoints_written
    );
    println!(
        "Scraping complete! Saved {} records to {}",
        report.records, config.output.output_path
    );

    Ok(())
}
