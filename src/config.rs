//! qrmark runtime configuration handling

use crate::error::{Error, Result};
use crate::qr::{DEFAULT_MODULE_SIZE, QrEncoder};
use crate::watermark::{DEFAULT_OPACITY, DEFAULT_SCALE, Position, WatermarkParams};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrmarkConfig {
    /// HTTP listener configuration
    pub server: ServerOptions,
    /// QR rendering configuration
    pub qr: QrOptions,
    /// Defaults for watermark form fields the caller leaves out
    pub watermark: WatermarkOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrmarkConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrmark.toml / qrmark.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrmark.toml", "qrmark.yaml", "qrmark.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrmark");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.server.apply_env_overrides();
        self.qr.apply_env_overrides();
        self.watermark.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// QR encoder built from the `qr` section.
    pub fn encoder(&self) -> QrEncoder {
        QrEncoder::new()
            .with_module_size(self.qr.module_size)
            .with_quiet_zone(self.qr.quiet_zone)
    }

    /// Validated watermark defaults.
    pub fn watermark_defaults(&self) -> Result<WatermarkParams> {
        self.watermark.to_params()
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Bind address for the HTTP server
    pub bind_address: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// Allowed browser origins for CORS; empty allows any origin
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: Vec::new(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(addr) = env::var("QRMARK_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Ok(port) = env::var("QRMARK_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                self.port = parsed;
            }
        }
        if let Ok(origins) = env::var("QRMARK_ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(limit) = env::var("QRMARK_MAX_UPLOAD_BYTES") {
            if let Ok(parsed) = limit.parse::<usize>() {
                self.max_upload_bytes = parsed;
            }
        }
    }

    /// Socket address helper for binding servers
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// QR rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Pixels per module
    pub module_size: u32,
    /// Render the four-module quiet zone
    pub quiet_zone: bool,
    /// Re-scan watermarked output and report whether it still decodes
    pub verify_output: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            module_size: DEFAULT_MODULE_SIZE,
            quiet_zone: true,
            verify_output: false,
        }
    }
}

impl QrOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(size) = env::var("QRMARK_QR_MODULE_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.module_size = parsed.max(1);
            }
        }
        if let Ok(verify) = env::var("QRMARK_QR_VERIFY") {
            if let Some(flag) = parse_flag(&verify) {
                self.verify_output = flag;
            }
        }
    }
}

/// Default watermark parameters
///
/// Values are kept raw and validated by [`WatermarkOptions::to_params`] so a
/// bad file reports a configuration error instead of a parse panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkOptions {
    /// Default anchor position
    pub position: Position,
    /// Default opacity cap (0-255)
    pub transparency: i64,
    /// Default overlay scale, in (0, 1]
    pub scale: f64,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            position: Position::Center,
            transparency: i64::from(DEFAULT_OPACITY),
            scale: DEFAULT_SCALE,
        }
    }
}

impl WatermarkOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(position) = env::var("QRMARK_WATERMARK_POSITION") {
            self.position = Position::parse(&position);
        }
        if let Ok(transparency) = env::var("QRMARK_WATERMARK_TRANSPARENCY") {
            if let Ok(parsed) = transparency.parse::<i64>() {
                self.transparency = parsed;
            }
        }
        if let Ok(scale) = env::var("QRMARK_WATERMARK_SCALE") {
            if let Ok(parsed) = scale.parse::<f64>() {
                self.scale = parsed;
            }
        }
    }

    /// Validate into compositing parameters.
    pub fn to_params(&self) -> Result<WatermarkParams> {
        WatermarkParams::new(self.position, self.transparency, self.scale)
            .map_err(|e| Error::Config(format!("Invalid watermark defaults: {e}")))
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRMARK_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stdout logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
    /// Enable request metrics aggregation and the `/metrics` route
    pub metrics: bool,
    /// Interval in seconds for emitting aggregated metrics when enabled
    pub metrics_interval_secs: u64,
    /// Output format for the metrics route (`json` or `prometheus`)
    pub metrics_format: MetricsFormat,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
            metrics: false,
            metrics_interval_secs: 60,
            metrics_format: MetricsFormat::Json,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRMARK_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRMARK_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRMARK_LOG_COLOR") {
            if let Some(flag) = parse_flag(&color) {
                self.color = flag;
            }
        }
        if let Ok(rotation) = env::var("QRMARK_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
        if let Ok(metrics) = env::var("QRMARK_METRICS") {
            if let Some(flag) = parse_flag(&metrics) {
                self.metrics = flag;
            }
        }
        if let Ok(interval) = env::var("QRMARK_METRICS_INTERVAL") {
            if let Ok(value) = interval.parse::<u64>() {
                self.metrics_interval_secs = value.max(5);
            }
        }
        if let Ok(format) = env::var("QRMARK_METRICS_FORMAT") {
            if let Ok(parsed) = format.parse::<MetricsFormat>() {
                self.metrics_format = parsed;
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

/// Supported serialization formats for the metrics route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Emit metrics as structured JSON
    Json,
    /// Emit metrics in Prometheus text exposition format
    Prometheus,
}

impl FromStr for MetricsFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "prometheus" => Ok(Self::Prometheus),
            _ => Err(format!(
                "Unsupported metrics format '{value}', expected 'json' or 'prometheus'"
            )),
        }
    }
}
