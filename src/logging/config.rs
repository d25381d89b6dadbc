//! Logging configuration
//!
//! Per-component log levels, output destinations and presets.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    pub global_level: String,

    /// Enable console output
    pub console_output: bool,

    /// Directory for daily-rolling JSON log files (None = no file logging)
    pub log_directory: Option<PathBuf>,

    /// Include file location in logs
    pub include_file_location: bool,

    /// Similarity judge log level
    pub judge_level: String,

    /// HTTP server and upload handling log level
    pub server_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_level: "info".to_string(),
            console_output: true,
            log_directory: None,
            include_file_location: false,
            judge_level: "info".to_string(),
            server_level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Verbose configuration for local development
    pub fn development() -> Self {
        Self {
            global_level: "debug".to_string(),
            console_output: true,
            log_directory: Some(PathBuf::from("logs")),
            include_file_location: true,
            judge_level: "trace".to_string(),
            server_level: "debug".to_string(),
        }
    }

    /// Quiet configuration for deployments
    pub fn production() -> Self {
        Self {
            global_level: "warn".to_string(),
            console_output: false,
            log_directory: Some(PathBuf::from("/var/log/pan-tamper-detector")),
            include_file_location: false,
            judge_level: "info".to_string(),
            server_level: "info".to_string(),
        }
    }

    /// Map a `-v` count onto a preset level, keeping the rest of the config.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let level = match verbose {
            0 => return self,
            1 => "debug",
            _ => "trace",
        };
        self.global_level = level.to_string();
        self.judge_level = level.to_string();
        self.server_level = level.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, level) in [
            ("global_level", &self.global_level),
            ("judge_level", &self.judge_level),
            ("server_level", &self.server_level),
        ] {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(format!(
                    "Invalid {}: {}. Must be one of: {:?}",
                    name, level, VALID_LEVELS
                ));
            }
        }

        if let Some(ref log_dir) = self.log_directory {
            if let Some(parent) = log_dir.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(format!("Log directory parent does not exist: {:?}", parent));
                }
            }
        }

        Ok(())
    }

    /// Get the effective log level for a specific component
    pub fn get_component_level(&self, component: &str) -> &str {
        match component {
            "judge" => &self.judge_level,
            "server" | "gateway" => &self.server_level,
            _ => &self.global_level,
        }
    }

    /// Build the env-filter directive string for this crate's modules.
    pub fn filter_directives(&self, crate_name: &str) -> String {
        format!(
            "{crate}={global},{crate}::judge={judge},{crate}::server={server},{crate}::gateway={server}",
            crate = crate_name,
            global = self.global_level,
            judge = self.get_component_level("judge"),
            server = self.get_component_level("server"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.global_level, "info");
        assert!(config.console_output);
        assert!(config.log_directory.is_none());
        assert!(!config.include_file_location);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert_eq!(config.global_level, "warn");
        assert!(!config.console_output);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.global_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.global_level = "debug".to_string();
        config.judge_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_verbosity_overrides_levels() {
        let config = LoggingConfig::default().with_verbosity(0);
        assert_eq!(config.global_level, "info");

        let config = LoggingConfig::default().with_verbosity(3);
        assert_eq!(config.judge_level, "trace");
        assert_eq!(config.get_component_level("server"), "trace");
    }

    #[test]
    fn test_filter_directives() {
        let config = LoggingConfig::development();
        let directives = config.filter_directives("pan_tamper_detector");
        assert!(directives.starts_with("pan_tamper_detector=debug"));
        assert!(directives.contains("pan_tamper_detector::judge=trace"));
        assert!(directives.contains("pan_tamper_detector::gateway=debug"));
    }
}
