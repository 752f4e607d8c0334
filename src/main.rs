use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use webapp_bundler::{run_server, util, Config, WebAppState};

/// Turn any web page into a downloadable installable web app shell.
#[derive(Debug, Parser)]
#[command(name = "webapp-bundler", version, about)]
struct Cli {
    /// Config file (default: ~/.config/webapp-bundler/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Write an example config file if none exists
    InitConfig,
}

#[derive(Debug, Default, clap::Args)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for transient workspaces
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Chrome/Chromium binary to use for captures
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Maximum number of concurrent browser sessions
    #[arg(long)]
    max_concurrent_captures: Option<usize>,

    /// Disable per-IP rate limiting
    #[arg(long)]
    no_rate_limit: bool,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.work_dir {
            config.work_root = dir;
        }
        if let Some(path) = self.chrome_path {
            config.capture.chrome_path = Some(path);
        }
        if let Some(max) = self.max_concurrent_captures {
            config.capture.max_concurrent = max;
        }
        if self.no_rate_limit {
            config.rate_limit.enabled = false;
        }
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false) // Disable ANSI colors in log file
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config_path = cli.config.unwrap_or_else(util::default_config_path);

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::InitConfig => {
            if Config::write_example(&config_path)? {
                println!("Wrote example config to {}", config_path.display());
            } else {
                println!("Config already exists at {}", config_path.display());
            }
            Ok(())
        }
        Command::Serve(args) => {
            let mut config = Config::load(&config_path)?;
            args.apply(&mut config);
            config.validate()?;

            fs::create_dir_all(&config.work_root).with_context(|| {
                format!("Failed to create work root {}", config.work_root.display())
            })?;

            tracing::info!(
                work_root = %config.work_root.display(),
                max_concurrent_captures = config.capture.max_concurrent,
                rate_limit = config.rate_limit.enabled,
                "Starting webapp-bundler"
            );

            let state = WebAppState::from_config(&config);
            run_server(state, config.server).await
        }
    }
}
