//! LogiTrack Configuration
//!
//! Layered configuration for the platform server:
//! - Built-in defaults
//! - Optional TOML file (`LT_CONFIG_PATH`, or `config/logitrack.toml` when present)
//! - Environment variable overrides (`LT_*`)
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LT_API_PORT` | `8080` | HTTP API port |
//! | `LT_METRICS_PORT` | `9090` | Metrics/health port |
//! | `LT_JWT_KEY` | - | HMAC signing secret (required) |
//! | `LT_JWT_ISSUER` | `logitrack` | Token issuer claim |
//! | `LT_JWT_AUDIENCE` | `logitrack` | Token audience claim |
//! | `LT_JWT_EXPIRES_MINUTES` | `60` | Session credential lifetime |
//! | `LT_JWT_CLOCK_SKEW_SECS` | `30` | Validation leeway |
//! | `LT_STORE` | `mongo` | Credential store (`mongo` or `memory`) |
//! | `LT_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `LT_MONGO_DB` | `logitrack` | MongoDB database name |
//! | `LT_DEV_MODE` | `false` | Seed development accounts |

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/logitrack.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_port: u16,
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: 8080,
            metrics_port: 9090,
        }
    }
}

/// Session credential settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC signing secret. Never logged.
    pub key: String,
    pub issuer: String,
    pub audience: String,
    pub expires_minutes: i64,
    pub clock_skew_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            issuer: "logitrack".to_string(),
            audience: "logitrack".to_string(),
            expires_minutes: 60,
            clock_skew_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "LT_STORE".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub mongo_url: String,
    pub mongo_db: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Mongo,
            mongo_url: "mongodb://localhost:27017".to_string(),
            mongo_db: "logitrack".to_string(),
        }
    }
}

/// Development account seeding
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub admin_password: String,
    pub user_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            admin_password: "Admin123!".to_string(),
            user_password: "User123!".to_string(),
        }
    }
}

impl AppConfig {
    /// Load defaults, then the TOML file, then process environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("LT_CONFIG_PATH").ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `LT_*` overrides from an arbitrary lookup (the process env in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LT_API_PORT") {
            self.server.api_port = parse_value("LT_API_PORT", &v)?;
        }
        if let Some(v) = lookup("LT_METRICS_PORT") {
            self.server.metrics_port = parse_value("LT_METRICS_PORT", &v)?;
        }
        if let Some(v) = lookup("LT_JWT_KEY") {
            self.jwt.key = v;
        }
        if let Some(v) = lookup("LT_JWT_ISSUER") {
            self.jwt.issuer = v;
        }
        if let Some(v) = lookup("LT_JWT_AUDIENCE") {
            self.jwt.audience = v;
        }
        if let Some(v) = lookup("LT_JWT_EXPIRES_MINUTES") {
            self.jwt.expires_minutes = parse_value("LT_JWT_EXPIRES_MINUTES", &v)?;
        }
        if let Some(v) = lookup("LT_JWT_CLOCK_SKEW_SECS") {
            self.jwt.clock_skew_secs = parse_value("LT_JWT_CLOCK_SKEW_SECS", &v)?;
        }
        if let Some(v) = lookup("LT_STORE") {
            self.store.kind = v.parse()?;
        }
        if let Some(v) = lookup("LT_MONGO_URL") {
            self.store.mongo_url = v;
        }
        if let Some(v) = lookup("LT_MONGO_DB") {
            self.store.mongo_db = v;
        }
        if let Some(v) = lookup("LT_DEV_MODE") {
            self.seed.enabled = v == "true" || v == "1";
        }
        Ok(())
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.jwt.key.trim().is_empty() {
            return Err(ConfigError::Missing("jwt.key / LT_JWT_KEY"));
        }
        if self.jwt.expires_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "jwt.expires_minutes".to_string(),
                value: self.jwt.expires_minutes.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
