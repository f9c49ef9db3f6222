//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::ALL_TYPES;
use crate::models::ComponentType;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// PcLedger - business reports for a PC build-and-resell shop
///
/// Pulls builds, inventory and buyers from the shop backend (or a local
/// JSON snapshot) and writes a Markdown/JSON report with sales figures,
/// component costs and low-stock alerts.
///
/// Examples:
///   pcledger
///   pcledger --api-url https://shop.example.com/api --format json
///   pcledger --local ./snapshot --as-of 2024-05-31
///   pcledger --fail-on-low-stock --low-stock-threshold 1
///   pcledger --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Backend API base URL
    ///
    /// Defaults to http://localhost:8080/api or the [backend] section of
    /// .pcledger.toml.
    #[arg(long, value_name = "URL", env = "PCLEDGER_API_URL")]
    pub api_url: Option<String>,

    /// Read a local snapshot directory instead of calling the backend
    ///
    /// Expects pcs.json; inventory.json, buyers.json, monthly.json,
    /// profit_analysis.json and components.json are optional. Takes
    /// precedence over --api-url.
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pcledger.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries for failed backend requests
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// Flag parts with this many units or fewer
    #[arg(long, value_name = "QTY")]
    pub low_stock_threshold: Option<u32>,

    /// Number of recent sales to list
    #[arg(long, value_name = "COUNT")]
    pub recent_sales: Option<usize>,

    /// Number of months in the monthly table
    #[arg(long, value_name = "COUNT")]
    pub months: Option<usize>,

    /// Date "this month" is measured against (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE", value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,

    /// Only list buyers and parts matching this text
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Only list inventory parts of this type ("all" for every type)
    #[arg(long = "type", value_name = "TYPE")]
    pub component_type: Option<String>,

    /// Also fetch every build's components (one request per build)
    #[arg(long)]
    pub with_components: bool,

    /// Exit with code 2 when any part is at or below the low-stock threshold
    ///
    /// Useful for scheduled restock checks.
    #[arg(long)]
    pub fail_on_low_stock: bool,

    /// Dry run: load the data and print record counts without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .pcledger.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    crate::models::parse_flexible_date(s)
        .ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.recent_sales == Some(0) {
            return Err("Recent sales must be at least 1".to_string());
        }

        if self.months == Some(0) {
            return Err("Months must be at least 1".to_string());
        }

        if let Some(ref ty) = self.component_type {
            if !ty.eq_ignore_ascii_case(ALL_TYPES) && ty.parse::<ComponentType>().is_err() {
                let known: Vec<String> = ComponentType::ALL.iter().map(|t| t.to_string()).collect();
                return Err(format!(
                    "Unknown component type '{}'. Expected one of: {}, {}",
                    ty,
                    ALL_TYPES,
                    known.join(", ")
                ));
            }
        }

        // Validate local directory if provided
        if let Some(ref local_path) = self.local {
            if !local_path.exists() {
                return Err(format!(
                    "Local directory does not exist: {}",
                    local_path.display()
                ));
            }
            if !local_path.is_dir() {
                return Err(format!(
                    "Local path is not a directory: {}",
                    local_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
