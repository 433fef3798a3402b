//! Configuration for the `Taskboard` client.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::board::BoardConfig;
use crate::notify::NoticeDurations;
use crate::repository::http::HttpConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    board: BoardFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[board]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    refresh_on_settle: Option<bool>,
    success_notice_ms: Option<u64>,
    error_notice_ms: Option<u64>,
    notice_buffer: Option<usize>,
}

/// `[ui]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- API --
    /// Backend base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Run against the built-in demo store instead of the backend.
    pub demo: bool,

    // -- Board --
    /// Re-read the listing after every mutation.
    pub refresh_on_settle: bool,
    /// How long success notices stay visible.
    pub success_notice: Duration,
    /// How long error and warning notices stay visible.
    pub error_notice: Duration,
    /// Capacity of the notice channel.
    pub notice_buffer: usize,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Due date display format (chrono).
    pub date_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            request_timeout: Duration::from_secs(10),
            demo: false,
            refresh_on_settle: true,
            success_notice: Duration::from_millis(2000),
            error_notice: Duration::from_millis(3000),
            notice_buffer: 64,
            poll_timeout: Duration::from_millis(50),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// Otherwise the default path (`~/.config/taskboard/config.toml`) is
    /// tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default. Split from `load()` for testing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            base_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.base_url),
            request_timeout: file
                .api
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            demo: cli.demo,
            refresh_on_settle: file
                .board
                .refresh_on_settle
                .unwrap_or(defaults.refresh_on_settle),
            success_notice: file
                .board
                .success_notice_ms
                .map_or(defaults.success_notice, Duration::from_millis),
            error_notice: file
                .board
                .error_notice_ms
                .map_or(defaults.error_notice, Duration::from_millis),
            notice_buffer: file
                .board
                .notice_buffer
                .unwrap_or(defaults.notice_buffer),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: cli
                .date_format
                .clone()
                .or_else(|| file.ui.date_format.clone())
                .unwrap_or(defaults.date_format),
        }
    }

    /// Settings for [`HttpRepository`](crate::repository::http::HttpRepository).
    #[must_use]
    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout,
        }
    }

    /// Settings for [`Board`](crate::board::Board).
    #[must_use]
    pub const fn board(&self) -> BoardConfig {
        BoardConfig {
            refresh_on_settle: self.refresh_on_settle,
        }
    }

    /// Notice display durations.
    #[must_use]
    pub const fn notice_durations(&self) -> NoticeDurations {
        NoticeDurations {
            success: self.success_notice,
            error: self.error_notice,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal task board")]
pub struct CliArgs {
    /// Base URL of the task backend.
    #[arg(long, env = "TASKBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use a built-in in-memory store with sample tasks.
    #[arg(long)]
    pub demo: bool,

    /// Due date display format (chrono format string).
    #[arg(long)]
    pub date_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// An explicit path must exist. Without one, the default path is tried
/// and a missing file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
