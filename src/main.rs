//! Keyword crawler main entry point
//!
//! This is the command-line interface that starts the crawl API server.

use anyhow::Context;
use clap::Parser;
use keyword_crawler::config::{load_config_with_hash, validate, Config};
use keyword_crawler::{api, CrawlerError, JobRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Keyword crawler: finds pages of one site that contain a keyword
///
/// Starts an HTTP API that accepts crawl requests for a keyword, crawls the
/// configured site with a small worker pool per request, and reports which
/// pages contain the keyword.
#[derive(Parser, Debug)]
#[command(name = "keyword-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A same-host keyword search crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL every crawl starts from (overrides the config file)
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Address the API listens on (overrides the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration, print it and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.check {
        handle_check(&config);
        return Ok(());
    }

    serve(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("keyword_crawler=info,warn"),
            1 => EnvFilter::new("keyword_crawler=debug,info"),
            2 => EnvFilter::new("keyword_crawler=trace,debug"),
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

/// Loads the config file (if any), applies overrides and validates the result
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .map_err(CrawlerError::from)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(base_url) = &cli.base_url {
        config.crawl.base_url = base_url.clone();
    }
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }

    validate(&config)
        .map_err(CrawlerError::from)
        .context("Invalid configuration")?;

    Ok(config)
}

/// Handles --check: prints the effective configuration
fn handle_check(config: &Config) {
    println!("=== Keyword Crawler Configuration ===\n");

    println!("Crawl:");
    println!("  Base URL: {}", config.crawl.base_url);
    println!("  Workers per crawl: {}", config.crawl.workers);
    println!("  Timeout: {}s", config.crawl.timeout_secs);
    println!("  Shutdown grace: {}s", config.crawl.shutdown_grace_secs);
    println!("  Milestone: {} matches", config.crawl.milestone);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Connect timeout: {}ms", config.fetcher.connect_timeout_ms);
    println!("  Read timeout: {}ms", config.fetcher.read_timeout_ms);

    println!("\nAdmission:");
    println!(
        "  Max concurrent jobs: {}",
        config.admission.max_concurrent_jobs
    );
    println!("  Backlog: {}", config.admission.backlog);

    println!("\nServer:");
    println!("  Bind: {}", config.server.bind);

    println!("\n✓ Configuration is valid");
}

/// Runs the API server until Ctrl-C, then stops all crawls
async fn serve(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(
        JobRegistry::from_config(&config)
            .map_err(CrawlerError::from)
            .context("Failed to build HTTP client")?,
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .map_err(|source| CrawlerError::Bind {
            addr: config.server.bind.clone(),
            source,
        })?;

    tracing::info!(
        bind = %config.server.bind,
        base_url = %config.crawl.base_url,
        workers = config.crawl.workers,
        max_concurrent_jobs = config.admission.max_concurrent_jobs,
        backlog = config.admission.backlog,
        "Keyword crawler listening"
    );

    let served = api::serve(listener, Arc::clone(&registry), shutdown_signal()).await;

    registry.shutdown().await;
    served.map_err(CrawlerError::from).context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
