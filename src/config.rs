//! # Configuration Management
//!
//! Centralized configuration for the word-board server.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `apply_env()`
//! - Command-line flags (applied by the binary last)
//!
//! Board dimensions and the listening address are fixed at process start;
//! nothing here is mutable at runtime.

use crate::error::{ProtocolError, Result};
use crate::utils::crypto::CipherSuite;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Port the server listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 26022;

/// Max allowed frame payload size (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Frame bound before a session is authenticated; fits RSA blocks up to 64k-bit keys
pub const HANDSHAKE_MAX_FRAME: usize = 8 * 1024;

/// Upper bound on board cells
pub const MAX_BOARD_CELLS: usize = 1_000_000;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Listener and authentication settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Board and dictionary settings
    #[serde(default)]
    pub game: GameConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Override fields from `SCRABBLE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("SCRABBLE_SERVER_ADDRESS") {
            self.server.address = addr;
        }

        if let Ok(path) = std::env::var("SCRABBLE_USERS_FILE") {
            self.server.users_file = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("SCRABBLE_WORDS_FILE") {
            self.game.words_file = PathBuf::from(path);
        }

        if let Ok(cipher) = std::env::var("SCRABBLE_CIPHER") {
            self.server.cipher = cipher.parse()?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.game.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Server-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:26022")
    pub address: String,

    /// Registry of usernames and base64 RSA public keys
    pub users_file: PathBuf,

    /// Cipher for command and reply frames
    #[serde(default)]
    pub cipher: CipherSuite,

    /// Largest accepted frame payload
    pub max_frame_size: usize,

    /// Pause after a failed accept before trying again
    #[serde(with = "duration_serde")]
    pub accept_backoff: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("0.0.0.0:{DEFAULT_PORT}"),
            users_file: PathBuf::from("passwd.txt"),
            cipher: CipherSuite::default(),
            max_frame_size: MAX_FRAME_SIZE,
            accept_backoff: Duration::from_millis(10),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:26022')",
                self.address
            ));
        }

        if self.users_file.as_os_str().is_empty() {
            errors.push("Users file path cannot be empty".to_string());
        }

        if self.max_frame_size < 1024 {
            errors.push(format!(
                "Max frame size too small: {} bytes (minimum: 1024)",
                self.max_frame_size
            ));
        } else if self.max_frame_size > 100 * 1024 * 1024 {
            errors.push(format!(
                "Max frame size too large: {} bytes (maximum: 100 MB)",
                self.max_frame_size
            ));
        }

        if self.accept_backoff.as_secs() > 10 {
            errors.push("Accept backoff too long (maximum: 10s)".to_string());
        }

        errors
    }
}

/// Board configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Board height
    pub rows: usize,

    /// Board width
    pub cols: usize,

    /// Word list; when the file is absent every word is accepted
    pub words_file: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            words_file: PathBuf::from("words"),
        }
    }
}

impl GameConfig {
    /// Validate board configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.rows == 0 || self.cols == 0 {
            errors.push(format!(
                "Board dimensions must be positive (got {} x {})",
                self.rows, self.cols
            ));
        } else if self.rows.saturating_mul(self.cols) > MAX_BOARD_CELLS {
            errors.push(format!(
                "Board too large: {} x {} (maximum {MAX_BOARD_CELLS} cells)",
                self.rows, self.cols
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,

    /// Whether to include the module target in each line
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            json_format: false,
            with_target: false,
        }
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
