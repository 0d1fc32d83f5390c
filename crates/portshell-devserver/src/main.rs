//! portshell — development server and build staging.
//!
//! # Usage
//!
//! ```text
//! portshell [OPTIONS] [COMMAND]
//!
//! Commands:
//!   serve  Run the development server (default)
//!   build  Stage entry pages and public files into build.out_dir
//!
//! Options:
//!   -c, --config <FILE>   Project config [default: portshell.toml]
//!
//! Server options (with or without `serve`):
//!   --host <IP>            Override server.host
//!   --port <PORT>          Override server.port
//!   --strict-port <BOOL>   Override server.strict_port
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                | Overrides            |
//! |-------------------------|----------------------|
//! | `PORTSHELL_CONFIG`      | `--config`           |
//! | `PORTSHELL_HOST`        | `server.host`        |
//! | `PORTSHELL_PORT`        | `server.port`        |
//! | `PORTSHELL_STRICT_PORT` | `server.strict_port` |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use portshell_devserver::application::run_build;
use portshell_devserver::domain::ShellConfig;
use portshell_devserver::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Development server and build staging for the portshell single-page app.
#[derive(Debug, Parser)]
#[command(name = "portshell", version)]
struct Cli {
    /// Project configuration file.  Defaults apply when it does not exist.
    #[arg(
        short,
        long,
        global = true,
        default_value = "portshell.toml",
        env = "PORTSHELL_CONFIG"
    )]
    config: PathBuf,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the development server (default).
    Serve,
    /// Stage entry pages and public files into build.out_dir.
    Build,
}

/// Overrides for the `[server]` table.
///
/// Parsed on the top-level command so that `portshell` without a subcommand
/// reads the same flags and environment variables as `portshell serve`.
#[derive(Debug, Default, Args)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, global = true, env = "PORTSHELL_HOST")]
    host: Option<IpAddr>,

    /// Port to bind.
    #[arg(long, global = true, env = "PORTSHELL_PORT")]
    port: Option<u16>,

    /// Fail instead of trying the next port when the port is taken.
    #[arg(long, global = true, env = "PORTSHELL_STRICT_PORT", value_name = "BOOL")]
    strict_port: Option<bool>,
}

impl ServeArgs {
    /// Applies the overrides and re-validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid (e.g.
    /// `--port 0`).
    fn apply(self, mut config: ShellConfig) -> anyhow::Result<ShellConfig> {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(strict_port) = self.strict_port {
            config.server.strict_port = strict_port;
        }
        config
            .validate()
            .context("invalid server overrides")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = ShellConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = cli.serve.apply(config)?;
            info!("portshell dev server starting on {}", config.bind_addr());
            run_server(config, shutdown_signal()).await?;
        }
        Command::Build => {
            let report = run_build(&config).context("build failed")?;
            info!(
                "wrote {} entr{} to {}",
                report.entries.len(),
                if report.entries.len() == 1 { "y" } else { "ies" },
                report.out_dir.display()
            );
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C; shutting down"),
        Err(e) => {
            tracing::error!("failed to listen for Ctrl+C signal: {e}");
            // Without a signal handler, run until the process is killed.
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
