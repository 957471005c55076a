use anyhow::{Context, Result};
use clap::Parser;

mod cli;

use cli::{execute_command, init_logging, Cli};

fn main() -> Result<()> {
    init_logging();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    execute_command(&cli).with_context(|| "command execution failed")
}
