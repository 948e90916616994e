//! Site-Mirror main entry point
//!
//! This is the command-line interface for the Site-Mirror single-site mirror.

use anyhow::Context;
use clap::Parser;
use site_mirror::config::{load_config_with_hash, validate, Config};
use site_mirror::crawler::crawl;
use site_mirror::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Mirror: mirror one website onto the local filesystem
///
/// Site-Mirror crawls every same-origin page reachable from the seed URL,
/// downloads the images they reference, and writes everything under the
/// output directory following the site's own path layout.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version)]
#[command(about = "Mirror a single website to disk", long_about = None)]
struct Cli {
    /// Seed URL to start from (overrides seed.base-url)
    #[arg(value_name = "URL")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory (overrides output.root-dir)
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Maximum concurrent page workers (overrides crawler.max-concurrent-pages)
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Maximum concurrent image downloads (overrides crawler.max-concurrent-images)
    #[arg(long, value_name = "N")]
    image_concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
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

/// Command-line values win over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        config.seed.base_url = seed.clone();
    }
    if let Some(output) = &cli.output {
        config.output.root_dir = output.clone();
    }
    if let Some(n) = cli.concurrency {
        config.crawler.max_concurrent_pages = n;
    }
    if let Some(n) = cli.image_concurrency {
        config.crawler.max_concurrent_images = n;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Mirror Dry Run ===\n");

    println!("Seed: {}", config.seed.base_url);

    println!("\nCrawler Configuration:");
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages
    );
    println!(
        "  Max concurrent images: {}",
        config.crawler.max_concurrent_images
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    println!("  Deduplicate images: {}", config.crawler.dedupe_images);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Root directory: {}", config.output.root_dir);
    println!("  Index file name: {}", config.output.index_file_name);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Mirroring {} into {} ({} page workers, {} image downloads)",
        config.seed.base_url,
        config.output.root_dir,
        config.crawler.max_concurrent_pages,
        config.crawler.max_concurrent_images
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let report = crawl(config, shutdown).await.context("Crawl failed")?;
    println!();
    print_report(&report);

    Ok(())
}
