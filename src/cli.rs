use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vastsync::{
    Dispatcher, Operation, RemoteHost, Settings, SystemShell, DEFAULT_SECRETS_PATH, DEFAULT_USER,
};

// CLI arguments parsing structure
#[derive(Parser)]
#[command(author, version, about = "Sync a project with a rented vast.ai host", long_about = None)]
pub struct Cli {
    /// JSON file holding `vast_num` and `port`
    #[arg(long, default_value = DEFAULT_SECRETS_PATH)]
    pub secrets: PathBuf,

    /// Local user name used to name remote directories
    #[arg(long, default_value = DEFAULT_USER)]
    pub user: String,

    /// One of: sync, connect, models, recent, setup, secrets, interp_sync, dotfiles, datasets
    pub command: Option<String>,
}

// Log to stderr, filtered by RUST_LOG
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

// Execute the selected command
pub fn execute_command(cli: &Cli) -> Result<()> {
    // The host config is loaded before the command is even looked at
    let host = RemoteHost::load(&cli.secrets).context("failed to load remote host config")?;
    let operation: Operation = cli.command.as_deref().context("no command given")?.parse()?;

    let settings = Settings::for_user(&cli.user);
    let shell = SystemShell;
    Dispatcher::new(&host, &settings, &shell).run(operation)
}
