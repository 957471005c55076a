use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

// Shell used to interpret every command line
const SHELL: &str = "sh";

/// Executes command lines the way an interactive user would type them.
///
/// Operations only ever talk to this trait, so tests can swap in a recorder.
pub trait Shell {
    /// Run a command with inherited stdio and wait for it.
    ///
    /// The exit status of the command is not reported back.
    ///
    /// # Errors
    ///
    /// Returns an error only if the shell itself cannot be started.
    fn call(&self, command: &str) -> Result<()>;

    /// Run a command and capture its standard output.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started or the command exits
    /// with a non-zero status.
    fn check_output(&self, command: &str) -> Result<Vec<u8>>;
}

// Runs commands through `sh -c` on the local machine
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn call(&self, command: &str) -> Result<()> {
        tracing::debug!(%command, "running");

        let status = Command::new(SHELL)
            .arg("-c")
            .arg(command)
            .status()
            .with_context(|| format!("failed to execute {SHELL} for: {command}"))?;

        if !status.success() {
            tracing::debug!(%command, %status, "command exited unsuccessfully");
        }

        Ok(())
    }

    fn check_output(&self, command: &str) -> Result<Vec<u8>> {
        tracing::debug!(%command, "capturing output");

        let output = Command::new(SHELL)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("failed to execute {SHELL} for: {command}"))?;

        if !output.status.success() {
            bail!("command returned {}: {command}", output.status);
        }

        Ok(output.stdout)
    }
}
