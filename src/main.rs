mod backup;
mod calc;
mod clock;
mod config;
mod ipc;
mod loader;
mod model;
mod ranking;
mod store;
mod views;

use anyhow::{anyhow, Context};
use clap::Parser;
use config::Config;
use model::Dataset;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use store::EntityStore;
use tracing_subscriber::EnvFilter;

/// Line-delimited JSON sidecar for the institute dashboard.
#[derive(Debug, Parser)]
#[command(name = "batchbookd", version, about)]
struct Cli {
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset JSON loaded at startup; overrides `data.seed_path`.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Pin "today" to an ISO date; overrides `clock.today`.
    #[arg(long)]
    today: Option<String>,
}

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn startup(cli: Cli) -> anyhow::Result<ipc::AppState> {
    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(today) = cli.today {
        if !clock::is_iso_date(&today) {
            return Err(anyhow!("--today must be YYYY-MM-DD, got {:?}", today));
        }
        cfg.clock.today = Some(today);
    }
    if let Some(seed) = cli.seed {
        cfg.data.seed_path = Some(seed);
    }
    init_tracing(&cfg);

    let dataset = match &cfg.data.seed_path {
        Some(path) => loader::load_dataset(path)
            .with_context(|| format!("failed to load seed {}", path.to_string_lossy()))?,
        None => Dataset::default(),
    };
    tracing::info!(
        students = dataset.students.len(),
        batches = dataset.batches.len(),
        tests = dataset.tests.len(),
        "store initialised"
    );
    Ok(ipc::AppState::new(EntityStore::new(dataset), cfg))
}

fn main() -> anyhow::Result<()> {
    let mut state = startup(Cli::parse())?;
    tracing::info!(today = %state.clock.today(), "batchbookd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, exiting");
    Ok(())
}
