//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the Listing-Harvest directory harvester.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use listing_harvest::config::{load_config_with_hash, Config};
use listing_harvest::model::resolve_state_code;
use listing_harvest::output::{list_result_files, ProgressEvent, ProgressReporter};
use listing_harvest::{discover_urls, extract_records, Category, CrawlRequest, Region};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: a business-directory harvester
///
/// Discovery collects listing URLs for a search term and city; extraction then
/// visits every collected URL and writes one contact record per listing.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A business-directory harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect listing URLs from paginated search results
    Discover(Target),

    /// Extract a record for every previously discovered URL
    Extract(Target),

    /// List configured provider keys and their search terms
    Providers,

    /// List produced URL, record and failed-URL files
    Results {
        /// Only show one state's folder
        #[arg(long)]
        state: Option<String>,
    },
}

/// What to harvest and where
#[derive(Args, Debug)]
struct Target {
    /// Configured provider key, e.g. dental-care
    #[arg(long, conflicts_with = "term", required_unless_present = "term")]
    provider: Option<String>,

    /// Free-form search term
    #[arg(long)]
    term: Option<String>,

    /// Two-letter state code or full state name
    #[arg(long)]
    state: String,

    #[arg(long)]
    city: String,

    /// Use the plain session instead of the challenge-aware one
    #[arg(long)]
    no_bypass: bool,
}

impl Target {
    /// Resolves the search term and region of this target
    fn resolve(&self, config: &Config) -> anyhow::Result<CrawlRequest> {
        let term = match (&self.provider, &self.term) {
            (Some(key), _) => Category::from_provider(key, &config.providers)?.0,
            (None, Some(term)) if !term.trim().is_empty() => term.clone(),
            _ => bail!("a non-empty --provider or --term is required"),
        };
        let region = Region::new(&self.state, &self.city)?;

        Ok(CrawlRequest::new(&term, region))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => load(path)?,
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::with_default_providers()
        }
    };

    match &cli.command {
        Command::Discover(target) => handle_discover(&config, target).await,
        Command::Extract(target) => handle_extract(&config, target).await,
        Command::Providers => {
            handle_providers(&config);
            Ok(())
        }
        Command::Results { state } => handle_results(&config, state.as_deref()),
    }
}

fn load(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
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

/// Cancels `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing the current step and stopping");
            token.cancel();
        }
    });
}

/// Starts rendering progress events; the task ends when the reporter is dropped
fn spawn_progress_renderer() -> (ProgressReporter, JoinHandle<()>) {
    let (reporter, receiver) = ProgressReporter::channel();
    (reporter, tokio::spawn(render_progress(receiver)))
}

async fn render_progress(mut events: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::PageParsed {
                page,
                cards,
                new_urls,
                total_urls,
            } => tracing::debug!(
                "page {}: {} cards, {} new URLs, {} total",
                page,
                cards,
                new_urls,
                total_urls
            ),
            ProgressEvent::ChallengeDetected { page, status } => {
                tracing::debug!("page {}: challenge (HTTP {})", page, status)
            }
            ProgressEvent::RetryScheduled {
                url,
                attempt,
                delay,
                ..
            } => tracing::debug!(
                "retry {} for {} in {:.1}s",
                attempt + 1,
                url,
                delay.as_secs_f64()
            ),
            ProgressEvent::RecordFailed { url, attempts, reason } => {
                tracing::debug!("failed {} after {} attempt(s): {}", url, attempts, reason)
            }
            ProgressEvent::ExtractionFinished {
                records,
                failed,
                skipped,
            } => tracing::info!(
                "Extraction totals: {} records, {} failed, {} skipped",
                records,
                failed,
                skipped
            ),
            other => tracing::trace!("{:?}", other),
        }
    }
}

/// Handles the `discover` command
async fn handle_discover(config: &Config, target: &Target) -> anyhow::Result<()> {
    let request = target.resolve(config)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let (progress, renderer) = spawn_progress_renderer();
    let result = discover_urls(config, &request, !target.no_bypass, &progress, &cancel).await;
    drop(progress);
    let _ = renderer.await;

    match result {
        Ok(report) => {
            println!("✓ {}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Discovery failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the `extract` command
async fn handle_extract(config: &Config, target: &Target) -> anyhow::Result<()> {
    let request = target.resolve(config)?;
    let category = request.category();
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let (progress, renderer) = spawn_progress_renderer();
    let result = extract_records(
        config,
        &request.region,
        &category,
        !target.no_bypass,
        &progress,
        &cancel,
    )
    .await;
    drop(progress);
    let _ = renderer.await;

    match result {
        Ok(report) => {
            println!("✓ {}", report);
            if report.failed_count > 0 {
                println!("  Failed URLs: {}", report.failed_path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Extraction failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the `providers` command
fn handle_providers(config: &Config) {
    println!("Providers ({}):", config.providers.len());
    for (key, term) in &config.providers {
        println!("  - {:<20} {}", key, term);
    }
}

/// Handles the `results` command
fn handle_results(config: &Config, state: Option<&str>) -> anyhow::Result<()> {
    let state = match state {
        Some(input) => match resolve_state_code(input) {
            Some(code) => Some(code),
            None => bail!("unknown state: {}", input),
        },
        None => None,
    };

    let output_dir = Path::new(&config.output.directory);
    let files = list_result_files(output_dir, state)
        .with_context(|| format!("failed to list {}", output_dir.display()))?;

    if files.is_empty() {
        println!("No result files under {}", output_dir.display());
        return Ok(());
    }

    let mut current_state = None;
    for file in &files {
        if current_state != Some(file.state.as_str()) {
            println!("\n{}:", file.state);
            current_state = Some(file.state.as_str());
        }

        let name = file
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = file
            .modified
            .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:<8} {:>6} rows  {}  {}",
            file.kind.as_str(),
            file.rows,
            modified,
            name
        );
    }

    Ok(())
}
