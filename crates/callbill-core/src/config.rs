//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use chrono::Datelike;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Billing-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// Caller field value that marks a call as anonymous
    #[serde(default = "default_anonymous_caller")]
    pub anonymous_caller: String,

    /// Earliest accepted call year
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Latest accepted call year (None = current calendar year)
    #[serde(default)]
    pub max_year: Option<i32>,
}

fn default_anonymous_caller() -> String {
    "Anonymous".to_string()
}

fn default_min_year() -> i32 {
    1876
}

impl BillingConfig {
    /// Upper bound for call years, resolved against the local clock when unset
    pub fn effective_max_year(&self) -> i32 {
        self.max_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            anonymous_caller: default_anonymous_caller(),
            min_year: default_min_year(),
            max_year: None,
        }
    }
}

/// CSV input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Rows longer than this many bytes are rejected
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Whether the first row of each file is a header
    #[serde(default)]
    pub has_headers: bool,
}

fn default_max_line_length() -> usize {
    1024
}

fn default_delimiter() -> char {
    ','
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            delimiter: default_delimiter(),
            has_headers: false,
        }
    }
}

/// Report output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory that receives bill and CDR files
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// Currency symbol printed after bill totals
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_true")]
    pub write_cdr: bool,

    #[serde(default = "default_true")]
    pub write_bills: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            currency: default_currency(),
            write_cdr: true,
            write_bills: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config files
    ///
    /// Sources, lowest precedence first: built-in defaults, `config/default`,
    /// `config/{RUN_MODE}`, the explicit `path` if given, then `CALLBILL__`
    /// prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = Config::builder()
            // Start with default values
            .set_default("billing.anonymous_caller", default_anonymous_caller())?
            .set_default("billing.min_year", default_min_year() as i64)?
            .set_default("input.max_line_length", default_max_line_length() as i64)?
            .set_default("input.delimiter", ",")?
            .set_default("input.has_headers", false)?
            .set_default("output.directory", ".")?
            .set_default("output.currency", default_currency())?
            .set_default("output.write_cdr", true)?
            .set_default("output.write_bills", true)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            // Load config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("CALLBILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Inclusive range of accepted call years
    pub fn year_bounds(&self) -> (i32, i32) {
        (self.billing.min_year, self.billing.effective_max_year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_billing_config() {
        let config = BillingConfig::default();
        assert_eq!(config.anonymous_caller, "Anonymous");
        assert_eq!(config.min_year, 1876);
        assert!(config.effective_max_year() >= 2021);
    }

    #[test]
    fn test_explicit_max_year_wins() {
        let config = BillingConfig {
            max_year: Some(2021),
            ..Default::default()
        };
        assert_eq!(config.effective_max_year(), 2021);
    }

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.input.max_line_length, 1024);
        assert_eq!(config.input.delimiter, ',');
        assert_eq!(config.output.currency, "€");
        assert!(config.output.write_cdr && config.output.write_bills);
    }
}
