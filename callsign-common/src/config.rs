//! Configuration loading and config file resolution
//!
//! Settings come from (highest priority first):
//! 1. Command-line flags (applied by the binary through [`ConfigOverrides`])
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! The config file itself is located by [`resolve_config_path`]: explicit
//! path, then the `CALLSIGN_LOOKUP_CONFIG` environment variable, then the
//! per-user and system-wide default locations. A missing default file is
//! not an error; the service starts on compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CALLSIGN_LOOKUP_CONFIG";

/// Directory name used under the platform config and data directories
const APP_DIR: &str = "callsign-lookup";

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportSettings,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file holding the member table
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Bulk import tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Number of concurrent store writers
    pub writers: usize,
    /// Capacity of the bounded write queue between the CSV reader and writers
    pub queue_capacity: usize,
    /// Upper bound on the multipart upload body
    pub max_upload_bytes: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            writers: 50,
            queue_capacity: 256,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Upload authentication
///
/// Identity is established by a fronting proxy that sets `user_header`.
/// Callers without it are redirected to `login_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub user_header: String,
    pub login_url: String,
    /// Treat every caller as authenticated. Development only.
    pub disabled: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-authenticated-user".to_string(),
            login_url: "/login".to_string(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Command-line overrides; `None` leaves the file/default value alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<SocketAddr>,
    pub database_path: Option<PathBuf>,
    pub writers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub log_level: Option<String>,
}

impl ServiceConfig {
    /// Parse a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text; absent keys take compiled defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from the resolved config file, or defaults
    ///
    /// An explicitly named file (argument or environment) must exist;
    /// a missing default-location file only produces a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            ConfigSource::Explicit(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml_file(&path)
            }
            ConfigSource::Discovered(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml_file(&path)
            }
            ConfigSource::Defaults => {
                warn!("No configuration file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply command-line overrides on top of file values
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(path) = overrides.database_path {
            self.database.path = path;
        }
        if let Some(writers) = overrides.writers {
            self.import.writers = writers;
        }
        if let Some(capacity) = overrides.queue_capacity {
            self.import.queue_capacity = capacity;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Reject settings the importer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.import.writers == 0 {
            return Err(Error::Config("import.writers must be at least 1".to_string()));
        }
        if self.import.queue_capacity == 0 {
            return Err(Error::Config(
                "import.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.import.max_upload_bytes == 0 {
            return Err(Error::Config(
                "import.max_upload_bytes must be at least 1".to_string(),
            ));
        }
        if !self.auth.disabled && self.auth.user_header.trim().is_empty() {
            return Err(Error::Config("auth.user_header must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line or in `CALLSIGN_LOOKUP_CONFIG`
    Explicit(PathBuf),
    /// Found at a default location
    Discovered(PathBuf),
    /// No file; compiled defaults
    Defaults,
}

/// Locate the config file
///
/// Priority: explicit argument, `CALLSIGN_LOOKUP_CONFIG`, user config dir,
/// `/etc/callsign-lookup/config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }

    default_config_candidates()
        .into_iter()
        .find(|p| p.exists())
        .map(ConfigSource::Discovered)
        .unwrap_or(ConfigSource::Defaults)
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(APP_DIR).join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc").join(APP_DIR).join("config.toml"));
    }
    candidates
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./callsign_data"))
        .join("members.db")
}
