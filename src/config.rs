//! # Configuration Management
//!
//! Centralized configuration for a bridge session.
//!
//! Every option the bridge understands lives here: write permission, fixed
//! terminal geometry, the handshake contents sent to the client, the write
//! chunk size, the initial input encoding and audit logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`TTY_BRIDGE_*`)

use crate::core::codec::Encoding;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::TerminalSize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Default size of a single front-bound message, tag included
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Smallest buffer that still leaves room for one raw byte per output message
pub const MIN_BUFFER_SIZE: usize = 5;

/// Max allowed buffer size (16 MB)
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Main bridge configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BridgeConfig {
    /// Terminal behaviour
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Settings announced to the client during the handshake
    #[serde(default)]
    pub client: ClientConfig,

    /// Message sizing and encoding
    #[serde(default)]
    pub transport: TransportConfig,

    /// Audit logging of terminal traffic
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("TTY_BRIDGE_PERMIT_WRITE") {
            config.terminal.permit_write = parse_env("TTY_BRIDGE_PERMIT_WRITE", &value)?;
        }

        if let Ok(value) = std::env::var("TTY_BRIDGE_WIDTH") {
            config.terminal.columns = parse_env("TTY_BRIDGE_WIDTH", &value)?;
        }

        if let Ok(value) = std::env::var("TTY_BRIDGE_HEIGHT") {
            config.terminal.rows = parse_env("TTY_BRIDGE_HEIGHT", &value)?;
        }

        if let Ok(title) = std::env::var("TTY_BRIDGE_TITLE") {
            config.terminal.title = title;
        }

        if let Ok(value) = std::env::var("TTY_BRIDGE_RECONNECT_SECS") {
            let secs: u64 = parse_env("TTY_BRIDGE_RECONNECT_SECS", &value)?;
            config.client.reconnect_interval = Duration::from_secs(secs);
        }

        if let Ok(value) = std::env::var("TTY_BRIDGE_BUFFER_SIZE") {
            config.transport.buffer_size = parse_env("TTY_BRIDGE_BUFFER_SIZE", &value)?;
        }

        if let Ok(value) = std::env::var("TTY_BRIDGE_ENCODING") {
            config.transport.encoding = parse_env("TTY_BRIDGE_ENCODING", &value)?;
        }

        if let Ok(value) = std::env::var("TTY_BRIDGE_AUDIT") {
            config.audit.enabled = parse_env("TTY_BRIDGE_AUDIT", &value)?;
        }

        if let Ok(username) = std::env::var("TTY_BRIDGE_USERNAME") {
            config.audit.username = Some(username);
        }

        Ok(config)
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

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.client.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.audit.validate());
        errors.extend(self.logging.validate());

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

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid value for {name}: '{value}'")))
}

/// Terminal behaviour of a session
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Whether client input is forwarded to the backend
    pub permit_write: bool,

    /// Fixed number of columns (0 lets the client decide)
    pub columns: u16,

    /// Fixed number of rows (0 lets the client decide)
    pub rows: u16,

    /// Window title announced to the client
    pub title: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            permit_write: false,
            columns: 0,
            rows: 0,
            title: String::new(),
        }
    }
}

impl TerminalConfig {
    /// Geometry pinned by this configuration; zero leaves a dimension to the client
    pub fn fixed_size(&self) -> TerminalSize {
        TerminalSize {
            columns: self.columns,
            rows: self.rows,
        }
    }

    /// Whether both dimensions are pinned, which makes client resizes moot
    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size().is_pinned()
    }
}

/// Settings sent to the client during the handshake
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// How long the client waits before reconnecting (zero disables reconnects)
    #[serde(with = "duration_secs_serde")]
    pub reconnect_interval: Duration,

    /// Client-side preferences forwarded verbatim as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_json::Value>,
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.reconnect_interval.as_secs() > 24 * 3600 {
            errors.push("Reconnect interval too long (maximum: 24 hours)".to_string());
        }

        if let Some(ref preferences) = self.preferences {
            if !preferences.is_object() {
                errors.push("Client preferences must be a table of settings".to_string());
            }
        }

        errors
    }

    /// Preferences as the JSON bytes sent to the client
    pub fn preferences_payload(&self) -> Result<Option<Vec<u8>>> {
        self.preferences
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(ProtocolError::from)
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Maximum size of a front-bound message, tag byte included
    pub buffer_size: usize,

    /// Encoding of client input until the client switches it
    pub encoding: Encoding,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            encoding: Encoding::Null,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.buffer_size < MIN_BUFFER_SIZE {
            errors.push(format!(
                "Buffer size too small: {} bytes (minimum: {MIN_BUFFER_SIZE})",
                self.buffer_size
            ));
        } else if self.buffer_size > MAX_BUFFER_SIZE {
            errors.push(format!(
                "Buffer size too large: {} bytes (maximum: 16 MB)",
                self.buffer_size
            ));
        }

        errors
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether terminal traffic is logged line by line
    pub enabled: bool,

    /// Label attached to every audit line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(ref username) = self.username {
            if username.is_empty() {
                errors.push("Audit username cannot be empty when set".to_string());
            } else if username.len() > 256 {
                errors.push(format!(
                    "Audit username too long: {} characters (maximum: 256)",
                    username.len()
                ));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("tty-bridge"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization as whole seconds
mod duration_secs_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
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
