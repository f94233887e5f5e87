// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod store;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{ErrorResponse, SubmitResponse};
use crate::cli::CliArgs;
use crate::config::{load_and_validate, resolve_config_path, ConfigFile, ServiceSettings, StoreMode};
use crate::engine::CommandService;
use crate::store::{CommandStore, MemoryStore};
use crate::types::{Command, QueueEntry, ScriptKind};

/// How often `run` checks whether all submitted work has finished.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(200);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the command store (memory or snapshot file)
/// - the command service with the shell executor
/// - boot recovery of queued commands
/// - Ctrl-C handling (stops every running command)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let store = open_store(&cfg.store)?;
    let service = CommandService::with_shell_executor(store, cfg.settings.clone());

    if args.list {
        print_state(&service).await?;
        return Ok(());
    }

    service.recover().await?;

    let kind = if args.sudo {
        ScriptKind::Sudo
    } else {
        ScriptKind::Plain
    };

    let mut rejected = 0usize;
    for script in &args.scripts {
        match service.submit(script, kind).await {
            Ok(submission) => print_json(&SubmitResponse::from(submission))?,
            Err(err) => {
                warn!(error = %err, "submission rejected");
                print_json(&ErrorResponse::from(&err))?;
                rejected += 1;
            }
        }
    }

    wait_until_idle(&service).await?;
    print_json(&service.list().await?)?;

    if rejected > 0 {
        return Err(anyhow!("{rejected} script(s) rejected"));
    }
    Ok(())
}

fn load_config(explicit: Option<&str>) -> Result<ConfigFile> {
    match resolve_config_path(explicit) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_and_validate(&path).with_context(|| format!("loading config {}", path.display()))
        }
        None => {
            debug!("no config file found; using defaults");
            Ok(ConfigFile {
                settings: ServiceSettings::default(),
                store: StoreMode::Memory,
            })
        }
    }
}

fn open_store(mode: &StoreMode) -> Result<Arc<dyn CommandStore>> {
    let store = match mode {
        StoreMode::Memory => MemoryStore::new(),
        StoreMode::File(path) => MemoryStore::open(path)
            .with_context(|| format!("opening command snapshot {}", path.display()))?,
    };
    Ok(Arc::new(store))
}

/// Block until nothing is running or queued, or until Ctrl-C, which stops
/// every running command first.
async fn wait_until_idle(service: &CommandService) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("listening for Ctrl-C")?;
                info!("interrupt received; stopping running commands");
                let stopped = service.stop_all_running().await?;
                info!(stopped, "shutdown complete");
                return Ok(());
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if service.is_idle().await? {
                    return Ok(());
                }
            }
        }
    }
}

#[derive(Serialize)]
struct StateView {
    commands: Vec<Command>,
    queue: Vec<QueueEntry>,
}

async fn print_state(service: &CommandService) -> Result<()> {
    let state = StateView {
        commands: service.list().await?,
        queue: service.queue().await?,
    };
    print_json(&state)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
