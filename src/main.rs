//! # DeskDrop CLI
//!
//! Picks up today's dated meeting files from the desktop, uploads them to
//! GitHub or Qiniu, files them into a backup folder and pushes a summary.
//!
//! Usage:
//!   deskdrop run                       # Daily production window
//!   deskdrop watch                     # Poll continuously
//!   deskdrop once                      # One cycle now
//!   deskdrop serve --port 3005         # HTTP API
//!   deskdrop scan                      # List today's candidates
//!   deskdrop config check              # Which backends are usable

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use deskdrop_channels::{PushPlusChannel, create_notifier};
use deskdrop_core::DeskDropConfig;
use deskdrop_core::traits::{NotificationChannel, StorageProvider};
use deskdrop_gateway::AppState;
use deskdrop_scheduler::{
    CycleOutcome, DatePredicate, FileScanner, OrchestratorSettings, Scheduler, SchedulerSettings,
    UploadOrchestrator,
};

#[derive(Parser)]
#[command(
    name = "deskdrop",
    version,
    about = "DeskDrop: upload today's meeting files from the desktop and push a summary"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check once a day inside the production window
    Run,

    /// Poll the scan directory at a fixed interval
    Watch,

    /// Run a single upload cycle now
    Once,

    /// Start the HTTP API (scheduler idle until switched on)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List today's matching files without uploading
    Scan,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Report which storage backends are configured
    Check,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "deskdrop=debug,deskdrop_core=debug,deskdrop_storage=debug,deskdrop_channels=debug,deskdrop_scheduler=debug,deskdrop_gateway=debug,tower_http=debug"
    } else {
        "deskdrop=info,deskdrop_storage=info,deskdrop_channels=info,deskdrop_scheduler=info,deskdrop_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut config = match &config_path {
        Some(path) => DeskDropConfig::load_from(path)?,
        None => DeskDropConfig::load()?,
    };
    config.apply_env();

    match cli.command {
        Commands::Run => {
            let scheduler = build_scheduler(&config)?;
            scheduler.start().await;
            println!("DeskDrop running in production mode. Press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
            scheduler.stop().await;
            println!("\nStopped.");
        }

        Commands::Watch => {
            let scheduler = build_scheduler(&config)?;
            scheduler.start_continuous().await;
            println!(
                "DeskDrop polling every {} s. Press Ctrl+C to stop.",
                config.schedule.poll_interval_secs
            );
            tokio::signal::ctrl_c().await?;
            scheduler.stop().await;
            println!("\nStopped.");
        }

        Commands::Once => {
            let scheduler = build_scheduler(&config)?;
            match scheduler.run_once().await {
                CycleOutcome::Completed(report) => {
                    println!(
                        "Uploaded {}/{} file(s), {} moved to backup",
                        report.successes.len(),
                        report.total(),
                        report.moved_count()
                    );
                    for r in &report.successes {
                        println!("  ok    {} -> {}", r.source_name, r.url.as_deref().unwrap_or(""));
                    }
                    for r in &report.failures {
                        println!("  fail  {}", r.source_name);
                    }
                }
                CycleOutcome::NoCandidates => println!("No matching files for today."),
                CycleOutcome::Skipped => println!("Another cycle is already running."),
                CycleOutcome::Failed(e) => anyhow::bail!("upload cycle failed: {e}"),
            }
        }

        Commands::Serve { port } => {
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid gateway address: {e}"))?;

            let channel = push_channel(&config);
            let storage = match deskdrop_storage::create_storage(&config) {
                Ok(storage) => Some(storage),
                Err(e) => {
                    tracing::warn!("Storage unavailable, storage routes will answer 503: {e}");
                    None
                }
            };
            let scheduler = match &storage {
                Some(storage) => Some(scheduler_for(&config, storage.clone(), channel.clone())?),
                None => None,
            };

            let state = Arc::new(AppState::new(config, storage, channel, scheduler.clone()));
            println!("DeskDrop API on http://{addr}");
            deskdrop_gateway::serve(state, addr, async {
                tokio::signal::ctrl_c().await.ok();
            })
            .await?;

            if let Some(scheduler) = scheduler {
                scheduler.stop().await;
            }
        }

        Commands::Scan => {
            let dir = config.scan_dir();
            let scanner = FileScanner::new(&dir, DatePredicate::new(config.scan.tag.clone()));
            let files = scanner.scan().await;
            println!("Scanning {}", dir.display());
            if files.is_empty() {
                println!("  (no matching files for today)");
            }
            for f in &files {
                println!("  {} ({:.2} KB)", f.name, f.size_kb());
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config)?;
                println!("{content}");
            }
            ConfigAction::Check => {
                let check = config.check();
                print_backend("GitHub", &check.github_missing);
                print_backend("Qiniu", &check.qiniu_missing);
                match check.current {
                    Some(kind) => println!("Active provider: {kind}"),
                    None => println!("Active provider: none"),
                }
                let push = if config.pushplus.token.is_some() { "configured" } else { "not configured" };
                println!("PushPlus: {push}");
            }
            ConfigAction::Init { force } => {
                let path = config_path.unwrap_or_else(DeskDropConfig::default_path);
                if path.exists() && !force {
                    println!("Config already exists: {} (use --force to overwrite)", path.display());
                    return Ok(());
                }
                DeskDropConfig::default().save_to(&path)?;
                println!("Config saved to: {}", path.display());
            }
        },
    }

    Ok(())
}

fn push_channel(config: &DeskDropConfig) -> Arc<dyn NotificationChannel> {
    Arc::new(PushPlusChannel::new(&config.pushplus, config.scan.tag.clone()))
}

fn scheduler_for(
    config: &DeskDropConfig,
    storage: Arc<dyn StorageProvider>,
    channel: Arc<dyn NotificationChannel>,
) -> Result<Arc<Scheduler>> {
    let orchestrator = Arc::new(UploadOrchestrator::new(
        storage,
        channel,
        create_notifier(&config.desktop),
        OrchestratorSettings::from_config(config),
    ));
    let settings = SchedulerSettings::from_config(config)?;
    Ok(Arc::new(Scheduler::new(orchestrator, settings)))
}

fn build_scheduler(config: &DeskDropConfig) -> Result<Arc<Scheduler>> {
    let storage = deskdrop_storage::create_storage(config)?;
    tracing::info!("Using {} storage", storage.name());
    scheduler_for(config, storage, push_channel(config))
}

fn print_backend(name: &str, missing: &[String]) {
    if missing.is_empty() {
        println!("{name}: configured");
    } else {
        println!("{name}: missing {}", missing.join(", "));
    }
}
