//! Configuration system for the Taskdesk server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk-server/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ApiSettings, DEFAULT_MAX_BODY_BYTES};
use crate::store::{OpenRetry, StoreLocation};

/// Errors that can occur when loading server configuration.
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

    /// The store connection string is unusable.
    #[error("invalid store url {url:?}")]
    InvalidStore {
        /// The rejected value.
        url: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the server.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerSection,
    store: StoreSection,
}

/// `[server]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_host: Option<String>,
    port: Option<u16>,
    max_body_bytes: Option<usize>,
    expose_internal_errors: Option<bool>,
}

/// `[store]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreSection {
    url: Option<String>,
    connect_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the task server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskdesk REST API server")]
pub struct ServerCliArgs {
    /// Host or IP address to listen on.
    #[arg(long, env = "TASKDESK_HOST")]
    pub host: Option<String>,

    /// Port to listen on. If taken, the next port is tried once.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Store connection string: `memory`, `file://<path>` or a bare path.
    #[arg(short, long, env = "TASKDESK_STORE")]
    pub store: Option<String>,

    /// Path to config file (default: `~/.config/taskdesk-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Largest accepted request body in bytes.
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Include store failure detail in error responses.
    #[arg(long, env = "TASKDESK_DEV")]
    pub dev: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind.
    pub bind_host: String,
    /// Preferred port.
    pub port: u16,
    /// Where tasks are kept.
    pub store: StoreLocation,
    /// How hard to try opening the store.
    pub open_retry: OpenRetry,
    /// Handler settings.
    pub api: ApiSettings,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5000,
            store: StoreLocation::Memory,
            open_retry: OpenRetry::default(),
            api: ApiSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and a missing
    /// file is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read or
    /// parsed, or the store url is empty.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ServerConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store = match cli.store.as_ref().or(file.store.url.as_ref()) {
            Some(url) => url.parse().map_err(|_| ConfigError::InvalidStore { url: url.clone() })?,
            None => defaults.store,
        };
        let open_retry = OpenRetry {
            attempts: file
                .store
                .connect_attempts
                .unwrap_or(defaults.open_retry.attempts),
            base_delay: file
                .store
                .retry_delay_ms
                .map_or(defaults.open_retry.base_delay, Duration::from_millis),
        };

        Ok(Self {
            bind_host: cli
                .host
                .clone()
                .or_else(|| file.server.bind_host.clone())
                .unwrap_or(defaults.bind_host),
            port: cli.port.or(file.server.port).unwrap_or(defaults.port),
            store,
            open_retry,
            api: ApiSettings {
                expose_internal_errors: cli.dev
                    || file
                        .server
                        .expose_internal_errors
                        .unwrap_or(defaults.api.expose_internal_errors),
                max_body_bytes: cli
                    .max_body_bytes
                    .or(file.server.max_body_bytes)
                    .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            },
            log_level: cli.log_level.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the server.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ServerConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ServerConfigFile::default());
    };
    let path = config_dir.join("taskdesk-server").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
