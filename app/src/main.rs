//! lcdscan - LCD policy discovery and download.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lcdscan::download::{download_policies, select_entries, DownloadOptions};
use lcdscan::session::{close_browser, FetchSession};
use lcdscan::store::{CatalogFile, DEFAULT_CATALOG_FILE};
use lcdscan_browser::PdfLayout;
use lcdscan_core::{AppConfig, StrategyKind};
use lcdscan_scanner::{DiscoveryOrchestrator, ProbeContext, RunSummary};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "lcdscan",
    about = "Discover and download Local Coverage Determination policies from the CMS Medicare Coverage Database",
    version
)]
struct Cli {
    /// Path to a TOML configuration file (default: the user config directory).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover valid policies and write the catalog.
    Discover {
        /// Catalog output path.
        #[arg(short, long, default_value = DEFAULT_CATALOG_FILE)]
        output: PathBuf,

        /// Quick run: no refinement and only the first page of each index.
        #[arg(long)]
        sample: bool,

        /// Run only these strategies, in this priority order (repeatable).
        #[arg(long = "strategy", value_name = "NAME")]
        strategies: Vec<StrategyKind>,

        /// Skip a strategy (repeatable).
        #[arg(long = "skip", value_name = "NAME")]
        skip: Vec<StrategyKind>,

        /// Maximum probes in flight.
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Render catalogued policies to PDF.
    Download {
        /// Catalog produced by `discover`.
        #[arg(long, default_value = DEFAULT_CATALOG_FILE)]
        catalog: PathBuf,

        /// Download every policy instead of a sample.
        #[arg(long)]
        all: bool,

        /// Number of policies in a sample download.
        #[arg(long)]
        sample_size: Option<usize>,

        /// Directory for the PDF files.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Write the default configuration file.
    InitConfig {
        /// Destination (default: the user config directory).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    lcdscan::init_tracing(cli.log_level.as_deref());

    tracing::info!("Starting lcdscan v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Discover {
            output,
            sample,
            strategies,
            skip,
            concurrency,
        } => {
            let mut config = AppConfig::load_with_env(cli.config.as_deref())
                .context("failed to load configuration")?;
            if !strategies.is_empty() {
                config.strategies.enabled = strategies;
            }
            config.strategies.enabled.retain(|kind| !skip.contains(kind));
            if let Some(concurrency) = concurrency {
                config.fetch.concurrency = concurrency;
            }
            config.validate().context("invalid configuration")?;

            let span = tracing::info_span!("discover", run_id = %Uuid::new_v4(), sample);
            discover(&config, &output, sample).instrument(span).await
        }
        Commands::Download {
            catalog,
            all,
            sample_size,
            output_dir,
        } => {
            let config = AppConfig::load_with_env(cli.config.as_deref())
                .context("failed to load configuration")?;
            let sample_size = sample_size.unwrap_or(config.render.sample_size);
            let output_dir = output_dir.unwrap_or_else(|| config.render.output_dir.clone());
            download(&config, &catalog, all, sample_size, output_dir).await
        }
        Commands::InitConfig { path, force } => {
            let path = match path {
                Some(path) => path,
                None => AppConfig::config_path()?,
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }
            AppConfig::default()
                .save_to(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight work");
            token.cancel();
        }
    });
}

async fn discover(config: &AppConfig, output: &Path, sample: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let session = FetchSession::start(&config.fetch).await?;
    let ctx = ProbeContext::from_config(config, session.fetcher())?.with_cancellation(cancel);
    let orchestrator = DiscoveryOrchestrator::from_config(config, ctx, sample)?;
    orchestrator
        .validate()
        .context("invalid discovery configuration")?;

    let summary = orchestrator.run().await;
    drop(orchestrator);
    session.close().await;

    let file = CatalogFile::from_catalog(
        &summary.catalog,
        &config.source.name,
        &summary.strategies(),
    );
    file.write_to(output)?;
    tracing::info!(path = %output.display(), total = file.total_policies, "catalog written");

    print_run_summary(&summary, output);
    Ok(())
}

fn print_run_summary(summary: &RunSummary, output: &Path) {
    println!("{}", "=".repeat(70));
    println!("DISCOVERY SUMMARY");
    println!("{}", "=".repeat(70));
    for report in &summary.reports {
        let status = match (&report.failure, report.cancelled) {
            (Some(error), _) => format!("failed: {error}"),
            (None, true) => "cancelled".to_string(),
            (None, false) => "ok".to_string(),
        };
        let credited = summary
            .catalog
            .strategy_breakdown()
            .get(&report.strategy)
            .copied()
            .unwrap_or(0);
        println!(
            "{:<28} {:>5} found, {:>5} credited | probed {} not-found {} ambiguous {} fetch-errors {} | {}",
            report.strategy.display_name(),
            report.records,
            credited,
            report.stats.probed,
            report.stats.not_found,
            report.stats.ambiguous,
            report.stats.fetch_errors,
            status
        );
    }
    println!("Duplicates dropped: {}", summary.duplicates_dropped);
    println!("Total policies: {}", summary.catalog.total());
    if summary.cancelled {
        println!("Run interrupted: the catalog holds partial results.");
    }
    println!("Catalog: {}", output.display());
}

async fn download(
    config: &AppConfig,
    catalog_path: &Path,
    all: bool,
    sample_size: usize,
    output_dir: PathBuf,
) -> Result<()> {
    let catalog = CatalogFile::read_from(catalog_path)
        .context("run `lcdscan discover` first to produce the catalog")?;
    let entries = select_entries(&catalog, all, sample_size);
    if entries.is_empty() {
        println!("Catalog {} holds no policies.", catalog_path.display());
        return Ok(());
    }

    println!(
        "Downloading {} of {} policies to {}",
        entries.len(),
        catalog.total_policies,
        output_dir.display()
    );

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let renderer = FetchSession::start_renderer(&config.fetch).await?;
    let options = DownloadOptions {
        output_dir,
        layout: PdfLayout::default(),
        timeout: config.fetch.timeout() * 2,
        delay: config.fetch.min_probe_delay(),
    };
    let result = download_policies(renderer.as_ref(), entries, &options, &cancel).await;
    close_browser(renderer).await;

    let summary = result?;
    println!("{}", "=".repeat(70));
    println!("DOWNLOAD SUMMARY");
    println!("{}", "=".repeat(70));
    println!("{summary}");
    println!("Output folder: {}", options.output_dir.display());
    Ok(())
}
