use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use gke_inventory::config::Config;
use gke_inventory::error::ScrapeError;
use gke_inventory::gcp::client::{format_gcp_error, GcpClient};
use gke_inventory::gcp::http::api_status;
use gke_inventory::inventory::{InstanceNameCorrelator, NoCorrelation, NodeCorrelator, Scraper};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Scrape Compute Engine instances and GKE node pools of a region
#[derive(Parser, Debug)]
#[command(name = "gke-inventory", version = gke_inventory::VERSION, about, long_about = None)]
struct Cli {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Config file (defaults to <config dir>/gke-inventory/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape data for compute & gke cluster
    Scrape(ScrapeArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Always required to perform scraping
    #[arg(long)]
    exec: bool,

    /// GCP project id
    #[arg(long)]
    project: Option<String>,

    /// Region name
    #[arg(long)]
    region: Option<String>,

    /// Target GKE cluster name
    #[arg(long)]
    cluster_name: Option<String>,

    /// Abort the scrape after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// How report nodes are matched with compute instances
    #[arg(long, value_enum, default_value = "none")]
    correlate: Correlation,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Correlation {
    None,
    InstanceName,
}

impl Correlation {
    fn correlator(self) -> Box<dyn NodeCorrelator> {
        match self {
            Correlation::None => Box::new(NoCorrelation),
            Correlation::InstanceName => Box::new(InstanceNameCorrelator),
        }
    }
}

/// Human-readable logs on stderr, JSON lines appended to `log_path`
fn setup_logging(
    level: LogLevel,
    log_path: &Path,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let filter = || {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(tracing_level).into())
            .from_env_lossy()
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path);

    match file {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter());

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();

            tracing::debug!("Log file: {:?}", log_path);
            Some(guard)
        },
        Err(e) => {
            tracing_subscriber::registry().with(stderr_layer).init();
            tracing::warn!("Unable to open log file {:?}: {}", log_path, e);
            None
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(Command::Scrape(args)) = &cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    if !args.exec {
        let mut command = Cli::command();
        if let Some(scrape) = command.find_subcommand_mut("scrape") {
            let _ = scrape.print_help();
        }
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Initializing config instance failed: {e}");
            return ExitCode::FAILURE;
        },
    };

    let _log_guard = setup_logging(cli.log_level, &config.log_path());

    match scrape(config, args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if api_status(&e).is_some() {
                tracing::error!(
                    error_message = %e,
                    hint = %format_gcp_error(&e),
                    "scraping ended with error"
                );
            } else {
                tracing::error!(error_message = %e, "scraping ended with error");
            }
            ExitCode::FAILURE
        },
    }
}

async fn scrape(mut config: Config, args: &ScrapeArgs) -> Result<()> {
    config.apply_overrides(
        args.project.as_deref(),
        args.region.as_deref(),
        args.cluster_name.as_deref(),
    );
    let target = config.target()?;

    let client = GcpClient::new(config.endpoints())
        .await
        .map_err(|e| ScrapeError::service_init("unable to create googleapi service", e))?;

    let scraper =
        Scraper::new(Arc::new(client), target).with_correlator(args.correlate.correlator());

    let scope = CancellationToken::new();
    if let Some(secs) = args.timeout {
        let deadline = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("Scrape deadline of {}s reached, cancelling", secs);
            deadline.cancel();
        });
    }

    let report = tokio::select! {
        report = scraper.run(&scope) => report?,
        _ = scope.cancelled(), if args.timeout.is_some() => {
            return Err(anyhow::anyhow!(
                "scrape did not finish within {}s",
                args.timeout.unwrap_or_default()
            ));
        },
    };

    println!("{}", report.to_json(args.pretty)?);
    Ok(())
}
