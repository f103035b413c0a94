mod config;
mod db;
mod disc;
mod ipc;
mod roster;

use anyhow::Context;
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(filter: &str) {
    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_engine(cfg: &config::Config) -> anyhow::Result<disc::DiscEngine> {
    match &cfg.tables_dir {
        Some(dir) => {
            let engine = disc::DiscEngine::load_dir(dir)?;
            info!(dir = %dir.display(), "reference tables loaded from directory");
            Ok(engine)
        }
        None => disc::DiscEngine::load_builtin().context("built-in reference tables"),
    }
}

fn run(cfg: config::Config) -> anyhow::Result<()> {
    let engine = load_engine(&cfg)?;
    let mut state = ipc::AppState::new(engine);

    if let Some(ws) = &cfg.workspace {
        let conn = db::open_db(ws).with_context(|| format!("open workspace {}", ws.display()))?;
        info!(workspace = %ws.display(), "workspace opened");
        state.workspace = Some(ws.clone());
        state.db = Some(conn);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "discd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => {
                debug!(id = %req.id, method = %req.method, "request");
                ipc::handle_request(&mut state, req)
            }
            // No id to echo back.
            Err(e) => ipc::err("", "bad_json", e.to_string(), None),
        };
        writeln!(stdout, "{}", resp).context("write response")?;
        stdout.flush().context("flush response")?;
    }

    info!("stdin closed, exiting");
    Ok(())
}

fn main() {
    let cfg = config::Config::from_env();
    init_tracing(&cfg.log_filter);

    if let Err(e) = run(cfg) {
        error!(error = %format!("{e:#}"), "discd failed");
        std::process::exit(1);
    }
}
