//! Startup settings for the reference server.
//!
//! Only two knobs exist: the listen address and whether to start with demo
//! data. They come from the `[server]` table of an optional TOML file and
//! can be overridden on the command line.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3001";

/// A settings file that exists but could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was tried.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for the `[server]` table.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser error.
        source: toml::de::Error,
    },
}

/// Command line of `taskboard-server`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskboard reference REST server")]
pub struct Args {
    /// Listen address, e.g. `127.0.0.1:8080`.
    #[arg(short, long, env = "TASKBOARD_SERVER_ADDR")]
    pub bind: Option<String>,

    /// Start with demo tasks and users.
    #[arg(long)]
    pub seed: bool,

    /// Settings file (default: `~/.config/taskboard-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Resolved startup settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the listener binds.
    pub bind_addr: String,
    /// Whether the store starts with demo data.
    pub seed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            seed: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct File {
    server: Settings,
}

impl Args {
    /// Reads the settings file, then applies the command line on top.
    ///
    /// Without `--config` the default path is tried and a missing file
    /// means defaults. `--seed` can only switch seeding on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing, or any file
    /// cannot be read or parsed.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let from_file = match &self.config {
            Some(path) => read(path)?,
            None => match default_path() {
                Some(path) if path.exists() => read(&path)?,
                _ => Settings::default(),
            },
        };
        Ok(self.overlay(from_file))
    }

    fn overlay(&self, mut settings: Settings) -> Settings {
        if let Some(bind) = &self.bind {
            settings.bind_addr.clone_from(bind);
        }
        settings.seed |= self.seed;
        settings
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskboard-server").join("config.toml"))
}

fn read(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(text: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str::<File>(text).map(|file| file.server)
}
