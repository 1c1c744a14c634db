use crate::error::{AttendanceError, Result};
use crate::models::CameraFacing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_JPEG_QUALITY: u8 = 50;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered client configuration
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub server_url: ConfigValue<String>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub jpeg_quality: ConfigValue<u8>,
    pub camera: ConfigValue<CameraFacing>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            server_url: ConfigValue::new(DEFAULT_SERVER_URL.to_string(), ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(DEFAULT_TIMEOUT_SECS, ConfigSource::Default),
            jpeg_quality: ConfigValue::new(DEFAULT_JPEG_QUALITY, ConfigSource::Default),
            camera: ConfigValue::new(CameraFacing::Back, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| AttendanceError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| AttendanceError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(server_url) = file_config.server_url {
            self.server_url.update(parse_server_url(&server_url)?, ConfigSource::File);
        }

        if let Some(timeout) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(check_timeout(timeout)?, ConfigSource::File);
        }

        if let Some(quality) = file_config.jpeg_quality {
            self.jpeg_quality.update(check_jpeg_quality(quality)?, ConfigSource::File);
        }

        if let Some(camera) = file_config.camera {
            self.camera.update(camera.parse()?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // ROLLCALL_SERVER_URL
        if let Ok(url) = env::var("ROLLCALL_SERVER_URL") {
            match parse_server_url(&url) {
                Ok(url) => self.server_url.update(url, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ROLLCALL_SERVER_URL value '{}': expected http:// or https:// URL",
                    url
                ),
            }
        }

        // ROLLCALL_TIMEOUT_SECS
        if let Ok(timeout_str) = env::var("ROLLCALL_TIMEOUT_SECS") {
            match parse_timeout_secs(&timeout_str) {
                Ok(timeout) => {
                    self.request_timeout_secs.update(timeout, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid ROLLCALL_TIMEOUT_SECS value '{}': expected positive integer",
                    timeout_str
                ),
            }
        }

        // ROLLCALL_JPEG_QUALITY
        if let Ok(quality_str) = env::var("ROLLCALL_JPEG_QUALITY") {
            match parse_jpeg_quality(&quality_str) {
                Ok(quality) => self.jpeg_quality.update(quality, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ROLLCALL_JPEG_QUALITY value '{}': expected 1-100",
                    quality_str
                ),
            }
        }

        // ROLLCALL_CAMERA
        if let Ok(camera_str) = env::var("ROLLCALL_CAMERA") {
            match camera_str.parse::<CameraFacing>() {
                Ok(camera) => self.camera.update(camera, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ROLLCALL_CAMERA value '{}': expected back or front",
                    camera_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(server_url) = overrides.server_url {
            self.server_url.update(server_url, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs.update(timeout, ConfigSource::Cli);
        }

        if let Some(quality) = overrides.jpeg_quality {
            self.jpeg_quality.update(quality, ConfigSource::Cli);
        }

        if let Some(camera) = overrides.camera {
            self.camera.update(camera, ConfigSource::Cli);
        }
    }

    /// Per-call network timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "server_url".to_string(),
            (self.server_url.value.clone(), self.server_url.source),
        );

        map.insert(
            "request_timeout_secs".to_string(),
            (
                format!("{}s", self.request_timeout_secs.value),
                self.request_timeout_secs.source,
            ),
        );

        map.insert(
            "jpeg_quality".to_string(),
            (self.jpeg_quality.value.to_string(), self.jpeg_quality.source),
        );

        map.insert("camera".to_string(), (self.camera.value.to_string(), self.camera.source));

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    jpeg_quality: Option<u8>,
    camera: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub server_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub jpeg_quality: Option<u8>,
    pub camera: Option<CameraFacing>,
}

/// Parse and normalize a server base URL (trailing slashes removed)
pub fn parse_server_url(s: &str) -> Result<String> {
    let trimmed = s.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(AttendanceError::ConfigInvalid {
            key: "server_url".to_string(),
            reason: format!("Invalid server URL: {}. Use http:// or https://", s),
        })
    }
}

/// Parse a request timeout in whole seconds
pub fn parse_timeout_secs(s: &str) -> Result<u64> {
    let value = s.trim().parse::<u64>().map_err(|_| AttendanceError::ConfigInvalid {
        key: "request_timeout_secs".to_string(),
        reason: format!("Invalid timeout: {}. Use a whole number of seconds", s),
    })?;
    check_timeout(value)
}

fn check_timeout(value: u64) -> Result<u64> {
    if value == 0 {
        return Err(AttendanceError::ConfigInvalid {
            key: "request_timeout_secs".to_string(),
            reason: "Timeout must be at least 1 second".to_string(),
        });
    }
    Ok(value)
}

/// Parse a JPEG quality level (1-100)
pub fn parse_jpeg_quality(s: &str) -> Result<u8> {
    let value = s.trim().parse::<u8>().map_err(|_| AttendanceError::ConfigInvalid {
        key: "jpeg_quality".to_string(),
        reason: format!("Invalid JPEG quality: {}. Use 1-100", s),
    })?;
    check_jpeg_quality(value)
}

fn check_jpeg_quality(value: u8) -> Result<u8> {
    if !(1..=100).contains(&value) {
        return Err(AttendanceError::ConfigInvalid {
            key: "jpeg_quality".to_string(),
            reason: format!("JPEG quality {} is outside 1-100", value),
        });
    }
    Ok(value)
}
