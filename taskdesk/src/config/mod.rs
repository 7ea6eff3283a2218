//! Configuration system for the Taskdesk terminal client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::net::NetConfig;
use crate::retry::RetryPolicy;

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

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    network: NetworkFileConfig,
    retry: RetryFileConfig,
    ui: UiFileConfig,
}

/// `[network]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NetworkFileConfig {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

/// `[retry]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RetryFileConfig {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Network --
    /// Base URL of the task API, e.g. `http://localhost:5000/api`.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Capacity of the command/event channels between the UI and the
    /// background data task.
    pub channel_capacity: usize,

    // -- Retry --
    /// Backoff schedule for reads.
    pub retry: RetryPolicy,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Due date display format (chrono).
    pub date_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            request_timeout: Duration::from_secs(10),
            channel_capacity: 64,
            retry: RetryPolicy::default(),
            poll_timeout: Duration::from_millis(50),
            date_format: "%b %d, %Y".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| file.network.api_url.clone())
                .unwrap_or(defaults.api_url),
            request_timeout: cli
                .timeout_secs
                .or(file.network.request_timeout_secs)
                .map_or(defaults.request_timeout, Duration::from_secs),
            channel_capacity: file
                .network
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            retry: RetryPolicy {
                max_attempts: file
                    .retry
                    .max_attempts
                    .unwrap_or(defaults.retry.max_attempts),
                base_delay: file
                    .retry
                    .base_delay_ms
                    .map_or(defaults.retry.base_delay, Duration::from_millis),
                max_delay: file
                    .retry
                    .max_delay_ms
                    .map_or(defaults.retry.max_delay, Duration::from_millis),
            },
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

    /// Settings for the background data task.
    #[must_use]
    pub fn to_net_config(&self) -> NetConfig {
        NetConfig {
            api_url: self.api_url.clone(),
            request_timeout: self.request_timeout,
            retry: self.retry,
            channel_capacity: self.channel_capacity,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal client for the Taskdesk task manager")]
pub struct CliArgs {
    /// Base URL of the task API.
    #[arg(long, env = "TASKDESK_API_URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path to config file (default: `~/.config/taskdesk/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Due date display format (chrono format string).
    #[arg(long)]
    pub date_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdesk.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskdesk").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
