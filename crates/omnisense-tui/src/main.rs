//! `omnisense-tui`: real-time dispatch board for the OmniSense backend.
//!
//! Built on [ratatui](https://ratatui.rs). Snapshots pushed by the backend
//! flow through `omnisense-core` into a ranked queue of call cards; the
//! operator's one outbound action is ending a finished call.
//!
//! Logs go to a file (default `/tmp/omnisense-tui.log`) so they never
//! corrupt the terminal. `--dump-plan` and `--check` run headless and
//! print to stdout instead of opening the board.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use omnisense_config::Config;
use omnisense_core::{Dashboard, DisplayMode, PendingClosurePolicy, render};

use crate::app::App;

/// Terminal dispatch board for OmniSense emergency calls.
#[derive(Parser, Debug)]
#[command(name = "omnisense-tui", version, about)]
struct Cli {
    /// Backend base URL (e.g., http://localhost:8000)
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Initial view: `active` or `all`
    #[arg(short = 'm', long)]
    mode: Option<DisplayMode>,

    /// Completed-but-unarchived placement: `all-calls` or `primary-queue`
    #[arg(long)]
    pending_closure: Option<PendingClosurePolicy>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Config file path (defaults to the platform config dir)
    #[arg(short = 'c', long, env = "OMNISENSE_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Log file path (defaults to /tmp/omnisense-tui.log)
    #[arg(long, default_value = "/tmp/omnisense-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Fetch the current state once, print its render plan as JSON, and exit
    #[arg(long, conflicts_with = "check")]
    dump_plan: bool,

    /// Probe backend health and exit
    #[arg(long)]
    check: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long, conflicts_with_all = ["dump_plan", "check"])]
    write_config: bool,
}

/// File-only tracing. Logging to stdout/stderr would corrupt the board.
/// The guard must live until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "omnisense_tui={log_level},omnisense_core={log_level},omnisense_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("omnisense-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Config file, then environment, then CLI flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => omnisense_config::load_config_from(path),
        None => omnisense_config::load_config(),
    }
    .wrap_err("loading configuration")?;

    if let Some(server) = &cli.server {
        cfg.server.clone_from(server);
    }
    if let Some(mode) = cli.mode {
        cfg.display.mode = mode;
    }
    if let Some(policy) = cli.pending_closure {
        cfg.display.pending_closure = policy;
    }
    if cli.insecure {
        cfg.insecure = true;
    }
    Ok(cfg)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let cfg = load_config(&cli)?;

    if cli.write_config {
        let path = match &cli.config {
            Some(path) => {
                omnisense_config::save_config_to(&cfg, path)?;
                path.clone()
            }
            None => omnisense_config::save_config(&cfg)?,
        };
        println!("wrote {}", path.display());
        return Ok(());
    }

    let dashboard = Dashboard::new(cfg.to_dashboard_config()?)?;
    info!(server = %cfg.server, mode = %cfg.display.mode, "starting omnisense-tui");

    if cli.check {
        let report = dashboard.health().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.is_healthy() {
            return Err(eyre!("backend reports status {:?}", report.status));
        }
        return Ok(());
    }

    if cli.dump_plan {
        let state = dashboard.refresh_from_rest().await?;
        let plan = render(&state, &cfg.render_options());
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let mut app = App::new(
        dashboard,
        cfg.render_options(),
        cfg.regions(),
        cfg.clock_interval(),
    );
    app.run().await
}
