//! Service configuration loading
//!
//! Loads configuration from `~/.config/pmtrack/service.toml` (or the path in
//! `PMTRACK_CONFIG`). Every field has a default, so an absent file or an
//! empty one both yield a working configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration for the HTTP service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path to the SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("pmtrack").join("pmtrack.db"))
        .unwrap_or_else(|| PathBuf::from("pmtrack.db"))
}

fn default_pool_size() -> u32 {
    8
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            db_path: default_db_path(),
            pool_size: default_pool_size(),
            max_body_bytes: default_max_body_bytes(),
            log_filter: default_log_filter(),
        }
    }
}

impl ServiceConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "PMTRACK_CONFIG";

    /// Environment variable that replaces the port of `bind`
    pub const ENV_PORT: &'static str = "PORT";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "service.toml";

    /// Load configuration from file
    ///
    /// Resolution order:
    /// 1. `explicit` (the `--config` flag); it must exist
    /// 2. `PMTRACK_CONFIG` environment variable
    /// 3. `~/.config/pmtrack/service.toml`
    ///
    /// A missing file in 2 or 3 yields the defaults. `PORT` is applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cfg = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let path = Self::resolve_config_path();
                if path.exists() {
                    Self::load_from_path(&path)?
                } else {
                    tracing::info!(
                        path = %path.display(),
                        "service config not found, using defaults"
                    );
                    Self::default()
                }
            }
        };

        let port = std::env::var(Self::ENV_PORT).ok();
        let cfg = cfg.with_port_override(port.as_deref())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: ServiceConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Replaces the port in `bind`, keeping the host.
    pub fn with_port_override(mut self, port: Option<&str>) -> Result<Self> {
        let Some(port) = port.map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(self);
        };
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{} is not a port: {port}", Self::ENV_PORT)))?;
        let mut addr = self.bind_addr()?;
        addr.set_port(port);
        self.bind = addr.to_string();
        Ok(self)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind {:?}: {e}", self.bind)))
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("pmtrack")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be at least 1".to_string()));
        }
        self.bind_addr()?;

        if self.max_body_bytes < 1024 {
            tracing::warn!(
                max_body_bytes = self.max_body_bytes,
                "request body limit is below 1 KiB, most writes will be rejected"
            );
        }
        if self.log_filter.trim().is_empty() {
            tracing::warn!("log_filter is empty, falling back to RUST_LOG only");
        }
        Ok(())
    }

    /// Effective configuration as TOML, for `check-config`.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
