use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use remote_sens::{
    global_registry, register_all, BackendSection, BoxedMetricSource, ConfigDocument,
    UpdateManager,
};
use std::path::PathBuf;
use std::time::Duration;

/// Tick of the poll loop; each source still waits for its own interval
const BASE_TICK: Duration = Duration::from_secs(1);

/// remote-sens - Poll Plex and Proxmox metrics for a dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "remote-sens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.yaml, then the user config dir)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source to poll, may be repeated (default: all registered sources)
    #[arg(short = 's', long = "source", value_name = "ID")]
    sources: Vec<String>,

    /// Proxmox node, overrides the config file
    #[arg(long = "node", value_name = "NODE")]
    node: Option<String>,

    /// Proxmox VM id for per-VM sources, overrides the config file
    #[arg(long = "vm-id", value_name = "VMID")]
    vm_id: Option<u32>,

    /// Poll interval in seconds (default: each backend's cache TTL)
    #[arg(short = 'i', long = "interval", value_name = "SECS")]
    interval: Option<u64>,

    /// Poll every source once, print the readings and exit
    #[arg(long = "once")]
    once: bool,

    /// List available sources
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting remote-sens v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    register_all();

    if cli.list {
        list_sources();
        return Ok(());
    }

    let document = match &cli.config {
        Some(path) => ConfigDocument::load(path),
        None => ConfigDocument::load_default(),
    };
    let overrides = BackendSection {
        node: cli.node.clone(),
        vm_id: cli.vm_id,
        ..Default::default()
    };

    // Sources own blocking HTTP clients, which must be created and dropped
    // outside the async runtime.
    let sources = create_sources(&cli.sources, &document, &overrides)?;
    if sources.is_empty() {
        warn!("No sources selected");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let manager = UpdateManager::new();
    let interval = cli.interval.map(Duration::from_secs);

    runtime.block_on(async {
        for (id, source) in sources {
            manager.add_source(&id, source, interval).await;
        }

        if cli.once {
            for reading in manager.poll_all().await {
                println!("{}", reading);
            }
        } else {
            manager
                .run(BASE_TICK, |reading| println!("{}", reading))
                .await;
        }
    });

    Ok(())
}

fn create_sources(
    ids: &[String],
    document: &ConfigDocument,
    overrides: &BackendSection,
) -> Result<Vec<(String, BoxedMetricSource)>> {
    let registry = global_registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let ids: Vec<String> = if ids.is_empty() {
        registry.list_sources().into_iter().map(|s| s.id).collect()
    } else {
        ids.to_vec()
    };

    let mut sources = Vec::with_capacity(ids.len());
    for id in ids {
        let source = registry
            .create_from_document(&id, document, overrides)
            .with_context(|| format!("Failed to create source {}", id))?;
        if !source.is_available() {
            warn!("Source {} has no {} backend configured", id, source.metadata().family);
        }
        sources.push((id, source));
    }
    Ok(sources)
}

fn list_sources() {
    let registry = global_registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    println!("Available sources:");
    for info in registry.list_sources() {
        println!("  {:<24} {:<8} {}", info.id, info.family.to_string(), info.name);
    }
}
