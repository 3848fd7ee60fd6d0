//! crawldb main entry point
//!
//! This is the command-line interface for the crawldb crawler.

use anyhow::Context;
use clap::Parser;
use crawldb::config::{load_config_with_hash, Config};
use crawldb::crawler::crawl;
use crawldb::output::{load_statistics, print_statistics};
use crawldb::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// crawldb: a polite crawler that builds a SQLite link graph
///
/// crawldb crawls an allow-listed set of domains while respecting
/// robots.txt, deduplicates pages by content hash, and stores pages,
/// binary documents, images and links in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "crawldb")]
#[command(version)]
#[command(about = "A polite crawler that builds a SQLite link graph", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawldb=info,warn"),
            1 => EnvFilter::new("crawldb=debug,info"),
            2 => EnvFilter::new("crawldb=trace,debug"),
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

/// Handles the --dry-run mode: prints the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== crawldb Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Idle timeout: {}ms", config.crawler.idle_timeout);
    println!("  Default crawl delay: {}ms", config.crawler.default_crawl_delay);
    println!("  Max binary size: {} bytes", config.crawler.max_binary_size);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!(
        "\nAllowed Domains ({}):",
        config.crawler.allowed_domains.len()
    );
    for pattern in &config.crawler.allowed_domains {
        println!("  - {}", pattern);
    }

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.crawler.seeds.len()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open crawl database")?;
    let stats = load_statistics(storage.conn())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Allowed domains: {}, seeds: {}",
        config.crawler.allowed_domains.join(", "),
        config.crawler.seeds.len()
    );

    let report = crawl(config).await.context("Crawl failed")?;
    tracing::info!(
        "Crawl completed successfully: {} pages stored",
        report.pages_stored()
    );

    Ok(())
}
