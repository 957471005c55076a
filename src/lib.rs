use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub mod accounts;
pub mod dotdict;
pub mod operations;
pub mod system;

pub use dotdict::{DotDict, DotDictError};
pub use operations::Dispatcher;
pub use system::{Shell, SystemShell};

// Constants
pub const DEFAULT_SECRETS_PATH: &str = "secrets/.vastnode";
pub const DEFAULT_USER: &str = "aidan";
pub const DEFAULT_DOTFILES_SOURCE: &str = "~/git/";

// Connection parameters of the rented machine
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteHost {
    #[serde(rename = "vast_num")]
    pub host_index: u32,
    pub port: u16,
}

impl RemoteHost {
    #[must_use]
    pub fn new(host_index: u32, port: u16) -> Self {
        Self { host_index, port }
    }

    /// Load the host parameters from a JSON secrets file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if it is not a JSON
    /// object carrying integer `vast_num` and `port` keys.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let json_content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read remote host config from {path_str}"))?;

        Self::parse(&json_content).with_context(|| format!("failed to parse JSON from {path_str}"))
    }

    /// Parse host parameters from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or lacks a required key.
    pub fn parse(content: &str) -> Result<Self> {
        let host: RemoteHost = serde_json::from_str(content)?;
        Ok(host)
    }

    /// Load the host parameters once at startup and log what was found
    ///
    /// # Errors
    ///
    /// Same as [`RemoteHost::from_file`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let host = Self::from_file(path)?;
        tracing::debug!(
            host_index = host.host_index,
            port = host.port,
            address = %host.address(),
            "loaded remote host"
        );
        Ok(host)
    }

    // SSH destination, e.g. root@ssh4.vast.ai
    #[must_use]
    pub fn address(&self) -> String {
        format!("root@ssh{}.vast.ai", self.host_index)
    }
}

// Local parameters that name directories on both ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub user: String,
    pub dotfiles_source: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            dotfiles_source: DEFAULT_DOTFILES_SOURCE.to_string(),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn for_user(user: &str) -> Self {
        Self {
            user: user.to_string(),
            ..Self::default()
        }
    }

    // Remote directory mirroring the local project
    #[must_use]
    pub fn project_dir(&self) -> String {
        format!("sparse_coding_{}", self.user)
    }

    // Remote directory receiving the dotfiles tree
    #[must_use]
    pub fn dotfiles_dir(&self) -> String {
        format!("dotfiles_{}", self.user)
    }
}

// Every command the router accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Sync,
    Connect,
    Models,
    Recent,
    Setup,
    Secrets,
    InterpSync,
    Dotfiles,
    Datasets,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Sync,
        Operation::Connect,
        Operation::Models,
        Operation::Recent,
        Operation::Setup,
        Operation::Secrets,
        Operation::InterpSync,
        Operation::Dotfiles,
        Operation::Datasets,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Sync => "sync",
            Operation::Connect => "connect",
            Operation::Models => "models",
            Operation::Recent => "recent",
            Operation::Setup => "setup",
            Operation::Secrets => "secrets",
            Operation::InterpSync => "interp_sync",
            Operation::Dotfiles => "dotfiles",
            Operation::Datasets => "datasets",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("command {0} not recognised")]
pub struct UnrecognizedCommand(pub String);

impl FromStr for Operation {
    type Err = UnrecognizedCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnrecognizedCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_embeds_host_index() {
        assert_eq!(RemoteHost::new(7, 22).address(), "root@ssh7.vast.ai");
    }

    #[test]
    fn test_parse_ignores_extra_keys() {
        let host = RemoteHost::parse(r#"{"vast_num": 5, "port": 41234, "note": "a100"}"#).unwrap();
        assert_eq!(host, RemoteHost::new(5, 41234));
    }

    #[test]
    fn test_parse_requires_port() {
        assert!(RemoteHost::parse(r#"{"vast_num": 5}"#).is_err());
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn test_operation_match_is_exact() {
        assert!("Sync".parse::<Operation>().is_err());
        assert!("interp-sync".parse::<Operation>().is_err());
        assert!(" sync".parse::<Operation>().is_err());
    }

    #[test]
    fn test_settings_directories() {
        let settings = Settings::for_user("logan");
        assert_eq!(settings.project_dir(), "sparse_coding_logan");
        assert_eq!(settings.dotfiles_dir(), "dotfiles_logan");
        assert_eq!(settings.dotfiles_source, DEFAULT_DOTFILES_SOURCE);
    }
}
