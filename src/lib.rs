// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod fs;
pub mod logging;
pub mod recorder;
pub mod registry;
pub mod schedule;
pub mod types;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{RuntimeEvent, RuntimeOptions, Scheduler, SweepReport};
use crate::errors::Result;
use crate::fetch::HttpFetcher;
use crate::recorder::ChangeRecorder;
use crate::registry::{open_registry, Registry};
use crate::types::ResourceId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - registry (storage) initialisation
/// - fetcher / recorder / scheduler
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;

    match args.command {
        Command::Config => {
            print_config(&cfg);
            Ok(())
        }
        Command::Run {
            once,
            sweep_on_start,
        } => run_scheduler(&cfg, open_storage(&cfg)?, once, sweep_on_start).await,
        Command::Add { url } => add_resource(open_storage(&cfg)?.as_ref(), &url),
        Command::List => list_resources(open_storage(&cfg)?.as_ref()),
        Command::History { id } => print_history(open_storage(&cfg)?.as_ref(), id),
    }
}

/// The only process-fatal storage condition.
fn open_storage(cfg: &ConfigFile) -> Result<Arc<dyn Registry>> {
    Ok(open_registry(cfg.storage_backend(), cfg.storage_path())?)
}

async fn run_scheduler(
    cfg: &ConfigFile,
    registry: Arc<dyn Registry>,
    once: bool,
    sweep_on_start: bool,
) -> Result<()> {
    let fetcher = HttpFetcher::new(cfg.fetch_timeout(), &cfg.fetch.user_agent)?;
    let recorder = Arc::new(ChangeRecorder::new(
        registry,
        Arc::new(fetcher),
        cfg.fetch_timeout(),
    ));

    // --once never needs the cadence.
    let cadence = (!once).then(|| cfg.cadence().clone());
    if let Some(cadence) = &cadence {
        info!(
            cron = cadence.expression(),
            timezone = cadence.timezone().name(),
            "scheduler starting"
        );
    }

    let scheduler = Scheduler::start(
        recorder,
        cadence,
        RuntimeOptions {
            exit_when_idle: once,
        },
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = scheduler.sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    if once || sweep_on_start {
        scheduler.trigger_now().await?;
    }

    let reports = scheduler.wait().await?;
    if once {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}

fn add_resource(registry: &dyn Registry, url: &str) -> Result<()> {
    let id = registry.insert_resource(url)?;
    info!(resource_id = %id, locator = %url, "tracking new resource");
    println!("{id}");
    Ok(())
}

fn list_resources(registry: &dyn Registry) -> Result<()> {
    for resource in registry.list_resources()? {
        let digest = resource
            .last_digest
            .as_deref()
            .map(|d| &d[..d.len().min(12)])
            .unwrap_or("-");
        println!("{}\t{}\t{}", resource.id, digest, resource.locator);
    }
    Ok(())
}

fn print_history(registry: &dyn Registry, id: ResourceId) -> Result<()> {
    let history = registry.list_history(id)?;
    debug!(resource_id = %id, records = history.len(), "loaded history");

    if history.is_empty() {
        println!("no changes recorded for resource {id}");
        return Ok(());
    }

    for record in history {
        println!("== {}", record.timestamp.to_rfc3339());
        if let Some(patch) = record.patch {
            print!("{patch}");
            if !patch.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn print_report(report: &SweepReport) {
    println!(
        "sweep {}: {} checked, {} baseline, {} unchanged, {} changed, {} fetch failures, {} storage failures",
        report.sweep_id,
        report.dispatched,
        report.baseline,
        report.unchanged,
        report.changed,
        report.fetch_failed,
        report.storage_failed,
    );
}

fn print_config(cfg: &ConfigFile) {
    println!("pagewatch config:");
    println!("  schedule: {:?} in {}", cfg.schedule.cron, cfg.schedule.timezone);
    println!("  fetch timeout: {:?}", cfg.fetch_timeout());
    println!("  user agent: {}", cfg.fetch.user_agent);
    println!("  storage: {}", cfg.storage_backend());
    if cfg.storage_backend() == types::StorageBackend::File {
        println!("  path: {}", cfg.storage_path().display());
    }

    println!("  next sweeps:");
    for at in cfg.cadence().upcoming(Utc::now(), 5) {
        println!("    - {}", at.to_rfc3339());
    }
}

