//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pcledger.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".pcledger.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend API settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Inventory alert settings.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "pcledger_report.md".to_string()
}

/// Backend REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the API, including the `/api` prefix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on transient failure.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    3
}

/// Inventory alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Parts at or below this quantity are flagged as low stock.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

fn default_low_stock_threshold() -> u32 {
    crate::analysis::DEFAULT_LOW_STOCK_THRESHOLD
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of sales listed under "Recent Sales".
    #[serde(default = "default_recent_sales_limit")]
    pub recent_sales_limit: usize,

    /// Number of months shown in the monthly table.
    #[serde(default = "default_months_shown")]
    pub months_shown: usize,

    /// Label printed after currency amounts.
    #[serde(default = "default_currency_label")]
    pub currency_label: String,

    /// Include the buyer directory.
    #[serde(default = "default_true")]
    pub include_buyers: bool,

    /// Include the full inventory table.
    #[serde(default = "default_true")]
    pub include_inventory: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_sales_limit: default_recent_sales_limit(),
            months_shown: default_months_shown(),
            currency_label: default_currency_label(),
            include_buyers: true,
            include_inventory: true,
        }
    }
}

fn default_recent_sales_limit() -> usize {
    crate::analysis::DEFAULT_RECENT_SALES_LIMIT
}

fn default_months_shown() -> usize {
    6
}

fn default_currency_label() -> String {
    "kr".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only values
    /// the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_url) = args.api_url {
            self.backend.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.backend.retries = retries;
        }

        if let Some(threshold) = args.low_stock_threshold {
            self.inventory.low_stock_threshold = threshold;
        }

        if let Some(limit) = args.recent_sales {
            self.report.recent_sales_limit = limit;
        }
        if let Some(months) = args.months {
            self.report.months_shown = months;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.api_url, "http://localhost:8080/api");
        assert_eq!(config.inventory.low_stock_threshold, 2);
        assert_eq!(config.report.recent_sales_limit, 5);
        assert_eq!(config.report.months_shown, 6);
        assert_eq!(config.report.currency_label, "kr");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "monthly.md"
verbose = true

[backend]
api_url = "https://shop.example.com/api"
retries = 0

[inventory]
low_stock_threshold = 5

[report]
currency_label = "NOK"
include_buyers = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "monthly.md");
        assert!(config.general.verbose);
        assert_eq!(config.backend.api_url, "https://shop.example.com/api");
        assert_eq!(config.backend.retries, 0);
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.inventory.low_stock_threshold, 5);
        assert_eq!(config.report.currency_label, "NOK");
        assert!(!config.report.include_buyers);
        assert!(config.report.include_inventory);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("[inventory]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend.api_url, Config::default().backend.api_url);
    }

    #[test]
    fn test_merge_only_overrides_given_flags() {
        let mut config: Config = toml::from_str(
            r#"
[backend]
api_url = "https://shop.example.com/api"

[inventory]
low_stock_threshold = 4
"#,
        )
        .unwrap();

        let args = Args::parse_from(["pcledger", "--low-stock-threshold", "1", "--months", "12"]);
        config.merge_with_args(&args);

        assert_eq!(config.backend.api_url, "https://shop.example.com/api");
        assert_eq!(config.inventory.low_stock_threshold, 1);
        assert_eq!(config.report.months_shown, 12);
        assert_eq!(config.report.recent_sales_limit, 5);
    }
}
