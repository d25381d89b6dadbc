use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DetectorError;
use crate::logging::LoggingConfig;

/// Upper bound for `server.max_concurrent_comparisons`.
pub const MAX_CONCURRENT_COMPARISONS: usize = 1024;

/// Upper bound for `server.max_upload_size_mb`.
pub const MAX_UPLOAD_SIZE_MB: usize = 1024;

/// Immutable service configuration, built once at startup and shared with
/// every handler.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub judge: JudgeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub max_upload_size_mb: usize,
    pub max_concurrent_comparisons: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub reference_filename: String,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// An upload passes only when its SSIM score is strictly above this value.
    pub threshold: f64,
    pub window_size: u32,
    pub k1: f64,
    pub k2: f64,
    pub dimension_policy: DimensionPolicy,
    pub max_dimension: u32,
}

/// What to do when the upload and the reference differ in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DimensionPolicy {
    /// Resample the upload to the reference dimensions before comparing.
    #[default]
    Resize,
    /// Fail the comparison with a dimension mismatch error.
    Reject,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size_mb: 10,
            max_concurrent_comparisons: 4,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            reference_filename: "reference_pan_card.png".to_string(),
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            window_size: 7,
            k1: 0.01,
            k2: 0.03,
            dimension_policy: DimensionPolicy::Resize,
            max_dimension: 10000,
        }
    }
}

impl ServerConfig {
    /// Request body limit in bytes.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl UploadConfig {
    pub fn reference_path(&self) -> PathBuf {
        self.upload_dir.join(&self.reference_filename)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> anyhow::Result<()> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.judge.threshold > -1.0 && self.judge.threshold <= 1.0) {
            errors.push("Judge threshold must be in (-1, 1]".to_string());
        }

        if self.judge.window_size < 3 || self.judge.window_size % 2 == 0 {
            errors.push("Judge window_size must be odd and at least 3".to_string());
        }

        if self.judge.k1 <= 0.0 || self.judge.k2 <= 0.0 {
            errors.push("Judge k1 and k2 must be positive".to_string());
        }

        if self.judge.max_dimension < self.judge.window_size {
            errors.push("Judge max_dimension must be at least window_size".to_string());
        }

        if self.upload.allowed_extensions.is_empty() {
            errors.push("Upload allow-list must not be empty".to_string());
        }

        if self.upload.reference_filename.trim().is_empty() {
            errors.push("Reference filename must not be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port must be valid".to_string());
        }

        if !(1..=MAX_UPLOAD_SIZE_MB).contains(&self.server.max_upload_size_mb) {
            errors.push(format!(
                "Server max_upload_size_mb must be between 1 and {}",
                MAX_UPLOAD_SIZE_MB
            ));
        }

        if !(1..=MAX_CONCURRENT_COMPARISONS).contains(&self.server.max_concurrent_comparisons) {
            errors.push(format!(
                "Server max_concurrent_comparisons must be between 1 and {}",
                MAX_CONCURRENT_COMPARISONS
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`Config::validate`], folding every problem into one
    /// [`DetectorError::InvalidConfig`].
    pub fn ensure_valid(&self) -> crate::error::Result<()> {
        self.validate()
            .map_err(|errors| DetectorError::InvalidConfig(errors.join("; ")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            other => Err(format!("unknown config format: {}", other)),
        }
    }
}

/// Load the config at `config_path`, falling back to defaults when the file
/// cannot be read or fails validation. Runs before logging is initialized,
/// so problems go to stderr.
pub fn load_config_or_default(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => {
                if let Err(errors) = config.validate() {
                    eprintln!("Configuration validation errors:");
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                    eprintln!("Using default configuration instead.");
                    Config::default()
                } else {
                    config
                }
            }
            Err(e) => {
                eprintln!("Failed to load config from '{}': {}", path.display(), e);
                eprintln!("Using default configuration.");
                Config::default()
            }
        },
        None => Config::default(),
    }
}
