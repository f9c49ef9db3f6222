//! Data models for the business ledger.
//!
//! This module contains the records served by the backend (PC builds,
//! components, inventory parts, buyers, server-side report rows) and the
//! derived structures the report is assembled from.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a PC build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcStatus {
    /// Parts are being assembled
    Building,
    /// Advertised for sale
    Listed,
    /// Sold to a buyer
    Sold,
    /// Retired without a sale
    Archived,
}

impl fmt::Display for PcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcStatus::Building => write!(f, "Building"),
            PcStatus::Listed => write!(f, "Listed"),
            PcStatus::Sold => write!(f, "Sold"),
            PcStatus::Archived => write!(f, "Archived"),
        }
    }
}

/// Slot a component occupies in a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Storage1,
    Storage2,
    Psu,
    Case,
    CpuCooler,
    Additional,
}

impl ComponentType {
    /// Every component type, in build-sheet order.
    pub const ALL: [ComponentType; 10] = [
        ComponentType::Cpu,
        ComponentType::Gpu,
        ComponentType::Motherboard,
        ComponentType::Ram,
        ComponentType::Storage1,
        ComponentType::Storage2,
        ComponentType::Psu,
        ComponentType::Case,
        ComponentType::CpuCooler,
        ComponentType::Additional,
    ];
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Cpu => write!(f, "CPU"),
            ComponentType::Gpu => write!(f, "GPU"),
            ComponentType::Motherboard => write!(f, "Motherboard"),
            ComponentType::Ram => write!(f, "RAM"),
            ComponentType::Storage1 => write!(f, "Storage 1"),
            ComponentType::Storage2 => write!(f, "Storage 2"),
            ComponentType::Psu => write!(f, "PSU"),
            ComponentType::Case => write!(f, "Case"),
            ComponentType::CpuCooler => write!(f, "CPU Cooler"),
            ComponentType::Additional => write!(f, "Additional"),
        }
    }
}

impl FromStr for ComponentType {
    type Err = String;

    /// Parses wire names (`CpuCooler`), database names (`cpucooler`) and
    /// display labels (`CPU Cooler`) alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "cpu" => Ok(ComponentType::Cpu),
            "gpu" => Ok(ComponentType::Gpu),
            "motherboard" => Ok(ComponentType::Motherboard),
            "ram" => Ok(ComponentType::Ram),
            "storage1" => Ok(ComponentType::Storage1),
            "storage2" => Ok(ComponentType::Storage2),
            "psu" => Ok(ComponentType::Psu),
            "case" => Ok(ComponentType::Case),
            "cpucooler" => Ok(ComponentType::CpuCooler),
            "additional" => Ok(ComponentType::Additional),
            _ => Err(format!("Unknown component type: {}", s)),
        }
    }
}

/// An assembled PC, from build through sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcBuild {
    pub id: Uuid,
    pub pc_name: String,
    pub status: PcStatus,
    #[serde(default, deserialize_with = "flexible_date")]
    pub build_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub list_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_listed: Option<i32>,
    #[serde(default)]
    pub days_held: Option<i32>,
    #[serde(default)]
    pub buyer_id: Option<Uuid>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platform_reference: Option<String>,
    #[serde(default)]
    pub intended_price: Option<Decimal>,
    #[serde(default)]
    pub actual_sale_price: Option<Decimal>,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    /// Sale price minus total cost, when computed by the backend.
    #[serde(default)]
    pub profit: Option<Decimal>,
    /// Profit as a percentage of total cost, when computed by the backend.
    #[serde(default)]
    pub profit_percentage: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PcBuild {
    /// Creates a bare build record with only identity, name and status set.
    #[cfg(test)]
    pub fn new(pc_name: impl Into<String>, status: PcStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            pc_name: pc_name.into(),
            status,
            build_date: None,
            list_date: None,
            sale_date: None,
            days_listed: None,
            days_held: None,
            buyer_id: None,
            platform: None,
            platform_reference: None,
            intended_price: None,
            actual_sale_price: None,
            total_cost: None,
            profit: None,
            profit_percentage: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_sold(&self) -> bool {
        self.status == PcStatus::Sold
    }
}

/// A part installed in a specific build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: Uuid,
    pub pc_id: Uuid,
    pub component_type: ComponentType,
    pub component_name: String,
    pub cost: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A build together with its parts, as served by `GET /pcs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcWithComponents {
    #[serde(flatten)]
    pub pc: PcBuild,
    #[serde(default)]
    pub components: Vec<Component>,
}

/// A catalog entry in the spare-parts inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPart {
    pub id: Uuid,
    pub component_type: String,
    pub component_name: String,
    #[serde(default)]
    pub buy_in_price: Option<Decimal>,
    #[serde(default)]
    pub typical_sell_price: Option<Decimal>,
    #[serde(default)]
    pub quantity_available: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub purchase_link: Option<String>,
}

/// A customer who bought (or may buy) a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// One row of the per-month sales rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Month in `YYYY-MM` form.
    pub month_year: String,
    #[serde(default)]
    pub total_sales: Option<Decimal>,
    #[serde(default)]
    pub total_profit: Option<Decimal>,
    #[serde(default)]
    pub pcs_sold: u64,
    #[serde(default)]
    pub average_days_held: Option<Decimal>,
    #[serde(default)]
    pub average_profit_margin: Option<Decimal>,
}

/// One row of the per-component-type cost rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAnalysis {
    pub component_type: String,
    #[serde(default)]
    pub avg_cost: Option<Decimal>,
    #[serde(default)]
    pub total_usage: u64,
    #[serde(default)]
    pub avg_profit_contribution: Option<Decimal>,
}

impl ProfitAnalysis {
    /// Human-readable label for the component type column.
    pub fn label(&self) -> String {
        self.component_type
            .parse::<ComponentType>()
            .map(|t| t.to_string())
            .unwrap_or_else(|_| self.component_type.clone())
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_pcs: usize,
    pub listed_pcs: usize,
    /// Sales revenue for the current calendar month.
    pub monthly_sales: Decimal,
    pub avg_days_to_sale: i64,
}

/// All-time totals over the monthly rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub total_pcs_sold: u64,
    pub average_profit: Decimal,
    pub profit_margin_percent: Decimal,
}

/// A component-type cost row with its relative bar width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCostBar {
    #[serde(flatten)]
    pub analysis: ProfitAnalysis,
    /// Average cost relative to the most expensive type (0-100).
    pub width_percent: Decimal,
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the data came from (backend URL or snapshot directory).
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// The date "this month" is measured against.
    pub as_of: NaiveDate,
    pub pcs_loaded: usize,
    pub parts_loaded: usize,
    pub buyers_loaded: usize,
    /// Stock level at or below which a part is flagged.
    pub low_stock_threshold: u32,
    /// Currency label used when rendering amounts.
    pub currency_label: String,
    pub duration_seconds: f64,
}

/// An inventory part with its computed margin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartLine {
    #[serde(flatten)]
    pub part: InventoryPart,
    pub margin_percent: Option<Decimal>,
}

/// Any build with its effective profit, for the builds listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildLine {
    #[serde(flatten)]
    pub pc: PcBuild,
    pub effective_profit: Option<Decimal>,
}

/// A sold build with its effective profit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    #[serde(flatten)]
    pub pc: PcBuild,
    pub effective_profit: Option<Decimal>,
    pub effective_profit_percentage: Option<Decimal>,
}

/// The complete business report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: DashboardStats,
    pub monthly_totals: MonthlyTotals,
    pub recent_months: Vec<MonthlySummary>,
    pub recent_sales: Vec<SaleLine>,
    /// Every build, in input order.
    pub builds: Vec<BuildLine>,
    pub component_costs: Vec<ComponentCostBar>,
    /// Summed cost of the loaded build components; zero when none were fetched.
    pub component_spend: Decimal,
    pub low_stock: Vec<InventoryPart>,
    /// Buy-in value tied up in the low-stock parts.
    pub low_stock_value: Decimal,
    pub inventory: Vec<PartLine>,
    pub buyers: Vec<Buyer>,
}

/// Deserialize an optional calendar date from either `YYYY-MM-DD` or a
/// full ISO-8601 date-time; only the date part is kept.
fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_flexible_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

/// Parse `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}
