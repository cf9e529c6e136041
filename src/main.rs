//! FTI Directory main entry point
//!
//! This is the command-line interface for the FTI member directory crawler.

use anyhow::Context;
use clap::Parser;
use fti_directory::config::{load_config_with_hash, validate, Config};
use fti_directory::crawler::{crawl, listing_url};
use fti_directory::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// FTI Directory: crawls the FTI member directory into a CSV file
///
/// Every letter of the listing is walked page by page; each member's detail
/// page is loaded on its own and flattened into one row per industrial club
/// membership.
#[derive(Parser, Debug)]
#[command(name = "fti-directory")]
#[command(version = "1.0.0")]
#[command(about = "Crawls the FTI member directory into CSV", long_about = None)]
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

    /// Only crawl these letters (e.g. "ABC"), overriding the config
    #[arg(long, value_name = "LETTERS")]
    letters: Option<String>,

    /// Write the CSV here instead of the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the listing URLs that would be visited and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config).await
    }
}

/// `-v` flags raise the crate's own level first, then everything else
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fti_directory=info,warn"),
            1 => EnvFilter::new("fti_directory=debug,info"),
            2 => EnvFilter::new("fti_directory=trace,debug"),
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

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(letters) = &cli.letters {
        tracing::info!("Letters overridden on the command line: {}", letters);
        config.crawler.letters = letters.to_ascii_uppercase();
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
    validate(config).context("Invalid command-line override")?;
    Ok(())
}

/// Prints the effective settings and every listing URL, then exits
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== FTI Directory Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Listing URL: {}", config.crawler.listing_url);
    println!("  Search type: {}", config.crawler.search_type);
    println!(
        "  Readiness timeout: {}ms",
        config.crawler.readiness_timeout_ms
    );
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!(
        "  Max pages per letter: {}",
        config.crawler.max_pages_per_letter
    );

    println!("\nRetry:");
    println!("  Detail attempts: {}", config.retry.detail_attempts);
    println!("  Advance attempts: {}", config.retry.advance_attempts);
    println!("  Backoff: {}ms", config.retry.backoff_ms);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    let letters = config.crawler.letter_list();
    println!("\nListings ({}):", letters.len());
    for letter in letters {
        let url = listing_url(
            &config.crawler.listing_url,
            config.crawler.search_type,
            letter,
        )?;
        println!("  - {}: {}", letter, url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling letters {} from {}",
        config.crawler.letters,
        config.crawler.listing_url
    );

    match crawl(config).await {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
