//! Dashboard and report aggregation.
//!
//! This module turns snapshots of builds, parts and server-side rollups
//! into the summary numbers shown on the dashboard and in the report.
//! Every function here is pure: it reads its input and returns fresh,
//! owned values. Missing data degrades to zero or `None`, never an error.

use crate::models::{
    ComponentCostBar, DashboardStats, InventoryPart, MonthlySummary, MonthlyTotals, PcBuild,
    PcStatus, ProfitAnalysis,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Stock level at or below which a part is flagged.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 2;

/// Number of sales listed under "Recent Sales".
pub const DEFAULT_RECENT_SALES_LIMIT: usize = 5;

/// Compute the dashboard headline numbers.
///
/// `now` decides which calendar month counts as "this month" for
/// `monthly_sales`.
pub fn compute_dashboard_stats(pcs: &[PcBuild], now: NaiveDate) -> DashboardStats {
    let total_pcs = pcs.len();
    let listed_pcs = pcs
        .iter()
        .filter(|pc| pc.status == PcStatus::Listed)
        .count();

    let monthly_sales = pcs
        .iter()
        .filter(|pc| {
            pc.sale_date
                .is_some_and(|d| d.year() == now.year() && d.month() == now.month())
        })
        .map(|pc| pc.actual_sale_price.unwrap_or_default())
        .sum();

    let days_held: Vec<i64> = pcs
        .iter()
        .filter(|pc| pc.is_sold())
        .filter_map(|pc| pc.days_held)
        .map(i64::from)
        .collect();

    let avg_days_to_sale = if days_held.is_empty() {
        0
    } else {
        let total: i64 = days_held.iter().sum();
        (total as f64 / days_held.len() as f64).round() as i64
    };

    DashboardStats {
        total_pcs,
        listed_pcs,
        monthly_sales,
        avg_days_to_sale,
    }
}

/// Parts whose available quantity is at or below `threshold`, in input order.
pub fn compute_low_stock(parts: &[InventoryPart], threshold: u32) -> Vec<InventoryPart> {
    parts
        .iter()
        .filter(|part| part.quantity_available <= threshold)
        .cloned()
        .collect()
}

/// Sum the monthly rollup into all-time totals.
pub fn compute_monthly_totals(summaries: &[MonthlySummary]) -> MonthlyTotals {
    let total_sales: Decimal = summaries
        .iter()
        .map(|m| m.total_sales.unwrap_or_default())
        .sum();
    let total_profit: Decimal = summaries
        .iter()
        .map(|m| m.total_profit.unwrap_or_default())
        .sum();
    let total_pcs_sold: u64 = summaries.iter().map(|m| m.pcs_sold).sum();

    // Zero divisors and out-of-range results both report zero
    let average_profit = total_profit
        .checked_div(Decimal::from(total_pcs_sold))
        .unwrap_or(Decimal::ZERO);

    let profit_margin_percent = total_profit
        .checked_div(total_sales)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);

    MonthlyTotals {
        total_sales,
        total_profit,
        total_pcs_sold,
        average_profit,
        profit_margin_percent,
    }
}

/// Rank component types by average cost and size their bars relative to
/// the most expensive one.
///
/// Rows without an average cost count as zero and sort last. When no row
/// has a positive cost every width is zero.
pub fn compute_component_bar_widths(analysis: &[ProfitAnalysis]) -> Vec<ComponentCostBar> {
    let mut rows = analysis.to_vec();
    rows.sort_by(|a, b| {
        b.avg_cost
            .unwrap_or_default()
            .cmp(&a.avg_cost.unwrap_or_default())
    });

    let max_cost = rows
        .iter()
        .filter_map(|row| row.avg_cost)
        .max()
        .unwrap_or_default();

    rows.into_iter()
        .map(|row| {
            let width_percent = if max_cost > Decimal::ZERO {
                row.avg_cost.unwrap_or_default() / max_cost * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            ComponentCostBar {
                analysis: row,
                width_percent,
            }
        })
        .collect()
}

/// The latest sold builds, newest sale first.
///
/// Builds without a sale date are skipped; equal dates keep input order.
pub fn compute_recent_sales(pcs: &[PcBuild], limit: usize) -> Vec<PcBuild> {
    let mut sales: Vec<PcBuild> = pcs
        .iter()
        .filter(|pc| pc.is_sold() && pc.sale_date.is_some())
        .cloned()
        .collect();

    sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
    sales.truncate(limit);
    sales
}

/// Markup of `sell_price` over `buy_price`, in percent.
///
/// `None` when either price is missing or the buy price is zero.
pub fn compute_margin(buy_price: Option<Decimal>, sell_price: Option<Decimal>) -> Option<Decimal> {
    let (buy, sell) = (buy_price?, sell_price?);
    if buy.is_zero() {
        return None;
    }

    (sell - buy)
        .checked_div(buy)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// The `n` most recent months of a monthly rollup, newest first.
pub fn recent_months(summaries: &[MonthlySummary], n: usize) -> Vec<MonthlySummary> {
    let mut months = summaries.to_vec();
    months.sort_by(|a, b| b.month_year.cmp(&a.month_year));
    months.truncate(n);
    months
}
