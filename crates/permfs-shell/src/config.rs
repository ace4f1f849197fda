use std::path::{Path, PathBuf};

use clap::Parser;
use permfs_core::{RegistryError, User, UserRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Parser, Debug, Default)]
#[command(name = "permfs-shell", about = "Multi-user in-memory filesystem shell")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// User to start the session as
    #[arg(short, long)]
    pub user: Option<String>,

    /// Print one JSON object per command instead of coloured text
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    pub script: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid user list: {0}")]
    Registry(#[from] RegistryError),
}

/// A user declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,
    pub uid: u32,
    pub group: String,
}

impl From<UserSpec> for User {
    fn from(user: UserSpec) -> Self {
        User::new(user.name, user.uid, user.group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Default log level (overridden by RUST_LOG)
    pub log_level: String,
    /// User the session starts as
    pub initial_user: String,
    /// JSON output
    pub json: bool,
    /// Replaces the built-in users when present
    pub users: Option<Vec<UserSpec>>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            initial_user: "root".to_string(),
            json: false,
            users: None,
        }
    }
}

impl ShellConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load the file named by `--config` (if any), then apply the flags.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(user) = &cli.user {
            self.initial_user = user.clone();
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if cli.json {
            self.json = true;
        }
    }

    pub fn registry(&self) -> Result<UserRegistry, ConfigError> {
        match &self.users {
            Some(users) => Ok(UserRegistry::new(users.iter().cloned().map(User::from))?),
            None => Ok(UserRegistry::bootstrap()),
        }
    }
}
