//! PcLedger - business reports for a PC build-and-resell shop
//!
//! A CLI tool that loads builds, inventory and buyers from the shop
//! backend or a local snapshot and generates sales, cost and stock
//! reports.
//!
//! Exit codes:
//!   0 - Success (no low stock, or no --fail-on-low-stock set)
//!   1 - Runtime error (connection, config, invalid snapshot, etc.)
//!   2 - Low-stock parts found with --fail-on-low-stock

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::{
    compute_component_bar_widths, compute_dashboard_stats, compute_low_stock, compute_margin,
    compute_monthly_totals, compute_recent_sales, effective_profit, effective_profit_percentage,
    filter_by_component_type, filter_by_search, low_stock_value, recent_months,
    total_component_cost,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{BuildLine, PartLine, Report, ReportMetadata, SaleLine};
use source::{BackendClient, Dataset, SnapshotLoader};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(log_level(&args, &config));

    info!("PcLedger v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_report(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pcledger.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the backend URL, stock threshold, currency label, and more.");
    Ok(())
}

/// Log level from the flags, raised to DEBUG by `[general] verbose`
/// unless `--quiet` is given.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging. `RUST_LOG` overrides the given level.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report workflow. Returns exit code (0 or 2).
async fn run_report(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load the data
    let (dataset, source) = load_dataset(&args, &config).await?;

    if args.dry_run {
        return handle_dry_run(&dataset, &config);
    }

    // Step 2: Build the report
    if !args.quiet {
        println!("📝 Generating report...");
    }

    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let duration = start_time.elapsed().as_secs_f64();
    let report = build_report(&dataset, &config, &args, source, as_of, duration);

    // Step 3: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = output_path(&args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let currency = config.report.currency_label.as_str();
    if !args.quiet {
        println!("\n📊 Summary:");
        println!(
            "   PCs: {} total, {} listed",
            report.dashboard.total_pcs, report.dashboard.listed_pcs
        );
        println!(
            "   Sales this month: {}",
            report::format_currency(report.dashboard.monthly_sales, currency)
        );
        println!(
            "   All-time profit: {} ({} margin)",
            report::format_signed_currency(report.monthly_totals.total_profit, currency),
            report::format_percent(report.monthly_totals.profit_margin_percent)
        );
        println!("   Low stock parts: {}", report.low_stock.len());
        println!(
            "\n✅ Report saved to: {}",
            output_path.display()
        );
    }

    if args.fail_on_low_stock && !report.low_stock.is_empty() {
        eprintln!(
            "\n⛔ {} part(s) at or below {} units. Failing (exit code 2).",
            report.low_stock.len(),
            config.inventory.low_stock_threshold
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load the dataset from the local snapshot or the backend.
///
/// Returns the data and a description of where it came from.
async fn load_dataset(args: &Args, config: &Config) -> Result<(Dataset, String)> {
    if let Some(ref local) = args.local {
        info!("Using local snapshot: {}", local.display());
        let loader = SnapshotLoader::new(local.clone());
        let dataset = loader
            .load()
            .with_context(|| format!("Failed to load snapshot {}", loader.dir().display()))?;
        return Ok((dataset, loader.dir().display().to_string()));
    }

    let client = BackendClient::new(
        &config.backend.api_url,
        config.backend.timeout_seconds,
        config.backend.retries,
    )
    .context("Failed to create HTTP client")?;

    let spinner = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Fetching data from {}", client.base_url()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let result = client.fetch_dataset(args.with_components).await;
    spinner.finish_and_clear();

    let dataset = result
        .with_context(|| format!("Failed to fetch data from {}", client.base_url()))?;
    Ok((dataset, client.base_url().to_string()))
}

/// Handle --dry-run: print what was loaded and exit.
fn handle_dry_run(dataset: &Dataset, config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: data loaded, no report written.\n");
    println!("   Loaded {}", dataset.describe());

    let low_stock = compute_low_stock(&dataset.inventory, config.inventory.low_stock_threshold);
    println!(
        "   Parts at or below {} units: {}",
        config.inventory.low_stock_threshold,
        low_stock.len()
    );

    println!("\n✅ Dry run complete.");
    Ok(0)
}

/// Assemble the report from a loaded dataset.
///
/// Headline figures always cover every record; `--search` and `--type`
/// only narrow the listing sections.
fn build_report(
    dataset: &Dataset,
    config: &Config,
    args: &Args,
    source: String,
    as_of: NaiveDate,
    duration_seconds: f64,
) -> Report {
    let threshold = config.inventory.low_stock_threshold;

    let mut pcs = dataset.pcs.clone();
    let mut parts = dataset.inventory.clone();
    let mut buyers = dataset.buyers.clone();

    if let Some(ref term) = args.search {
        debug!("Filtering listings by search term '{}'", term);
        pcs = filter_by_search(&pcs, term);
        parts = filter_by_search(&parts, term);
        buyers = filter_by_search(&buyers, term);
    }
    if let Some(ref component_type) = args.component_type {
        parts = filter_by_component_type(&parts, component_type);
    }

    let recent_sales = compute_recent_sales(&pcs, config.report.recent_sales_limit)
        .into_iter()
        .map(|pc| SaleLine {
            effective_profit: effective_profit(&pc),
            effective_profit_percentage: effective_profit_percentage(&pc),
            pc,
        })
        .collect();

    let builds = pcs
        .into_iter()
        .map(|pc| BuildLine {
            effective_profit: effective_profit(&pc),
            pc,
        })
        .collect();

    let inventory = if config.report.include_inventory {
        parts
            .into_iter()
            .map(|part| PartLine {
                margin_percent: compute_margin(part.buy_in_price, part.typical_sell_price),
                part,
            })
            .collect()
    } else {
        Vec::new()
    };

    if !config.report.include_buyers {
        buyers.clear();
    }

    let low_stock = compute_low_stock(&dataset.inventory, threshold);
    if !low_stock.is_empty() {
        warn!("{} part(s) at or below {} units", low_stock.len(), threshold);
    }

    Report {
        metadata: ReportMetadata {
            source,
            generated_at: Utc::now(),
            as_of,
            pcs_loaded: dataset.pcs.len(),
            parts_loaded: dataset.inventory.len(),
            buyers_loaded: dataset.buyers.len(),
            low_stock_threshold: threshold,
            currency_label: config.report.currency_label.clone(),
            duration_seconds,
        },
        dashboard: compute_dashboard_stats(&dataset.pcs, as_of),
        monthly_totals: compute_monthly_totals(&dataset.monthly),
        recent_months: recent_months(&dataset.monthly, config.report.months_shown),
        recent_sales,
        builds,
        component_costs: compute_component_bar_widths(&dataset.profit_analysis),
        component_spend: total_component_cost(&dataset.components),
        low_stock_value: low_stock_value(&low_stock),
        low_stock,
        inventory,
        buyers,
    }
}

/// Report path: `--output`, else the configured path with the format's extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    if let Some(ref output) = args.output {
        return output.clone();
    }
    PathBuf::from(&config.general.output).with_extension(args.format.extension())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
