use std::env;
use std::fmt;

use shared::database::DatabaseConfig;
use shared::observability::{LogFormat, LogLevel};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_NAME: &str = "Akwara";
pub const DEFAULT_FOLDER: &str = "Akwara";
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Application configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Answer 401 on every failure of list/add/remove, as older clients expect
    pub legacy_status_codes: bool,
}

#[derive(Clone)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::MissingVar(key));

        let config = Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or("PORT", var("PORT"), DEFAULT_PORT)?,
                legacy_status_codes: parse_flag("LEGACY_STATUS_CODES", var("LEGACY_STATUS_CODES"))?,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL")
                    .or_else(|| var("MONGODB_URI"))
                    .ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                database_name: var("DATABASE_NAME")
                    .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    var("DATABASE_MAX_CONNECTIONS"),
                    10,
                )?,
                ..Default::default()
            },
            storage: StorageConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                folder: var("CLOUDINARY_FOLDER").unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
                api_base: var("CLOUDINARY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout_secs: parse_or("CLOUDINARY_TIMEOUT_SECS", var("CLOUDINARY_TIMEOUT_SECS"), 30)?,
            },
            log_level: match var("LOG_LEVEL") {
                Some(raw) => raw.parse::<LogLevel>().map_err(|_| ConfigError::InvalidValue {
                    key: "LOG_LEVEL",
                    value: raw,
                })?,
                None => LogLevel::default(),
            },
            log_format: match var("LOG_FORMAT") {
                Some(raw) => raw.parse::<LogFormat>().map_err(|_| ConfigError::InvalidValue {
                    key: "LOG_FORMAT",
                    value: raw,
                })?,
                None => LogFormat::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidConfig("Max connections must be > 0".to_string()));
        }

        if !self.storage.api_base.starts_with("http://") && !self.storage.api_base.starts_with("https://") {
            return Err(ConfigError::InvalidConfig(format!(
                "Storage API base must be an http(s) URL, got {}",
                self.storage.api_base
            )));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn parse_flag(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
