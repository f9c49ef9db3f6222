//! Markdown report generation.
//!
//! This module renders the business report as Markdown or JSON.

use crate::models::{
    BuildLine, Buyer, ComponentCostBar, DashboardStats, InventoryPart, MonthlySummary,
    MonthlyTotals, PartLine, Report, ReportMetadata, SaleLine,
};
use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Placeholder for values the backend did not provide.
const MISSING: &str = "N/A";

/// Characters in a full-width component cost bar.
const BAR_CELLS: u32 = 20;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let currency = report.metadata.currency_label.as_str();
    let mut output = String::new();

    // Title
    output.push_str("# PcLedger Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_dashboard_section(&report.dashboard, currency));
    output.push_str(&generate_totals_section(&report.monthly_totals, currency));
    output.push_str(&generate_monthly_section(&report.recent_months, currency));
    output.push_str(&generate_sales_section(&report.recent_sales, currency));
    output.push_str(&generate_builds_section(&report.builds, currency));
    output.push_str(&generate_component_section(
        &report.component_costs,
        report.component_spend,
        currency,
    ));
    output.push_str(&generate_low_stock_section(
        &report.low_stock,
        report.low_stock_value,
        report.metadata.low_stock_threshold,
        currency,
    ));
    output.push_str(&generate_inventory_section(&report.inventory, currency));
    output.push_str(&generate_buyers_section(&report.buyers));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **As Of:** {}\n", metadata.as_of));
    section.push_str(&format!(
        "- **Records:** {} PCs, {} parts, {} buyers\n",
        metadata.pcs_loaded, metadata.parts_loaded, metadata.buyers_loaded
    ));
    section.push_str(&format!(
        "- **Low Stock Threshold:** {}\n",
        metadata.low_stock_threshold
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Dashboard](#dashboard)\n");
    toc.push_str("- [Sales Totals](#sales-totals)\n");
    toc.push_str("- [Monthly Sales](#monthly-sales)\n");
    toc.push_str("- [Recent Sales](#recent-sales)\n");
    if !report.builds.is_empty() {
        toc.push_str("- [Builds](#builds)\n");
    }
    toc.push_str("- [Component Costs](#component-costs)\n");
    toc.push_str("- [Low Stock Alert](#low-stock-alert)\n");

    if !report.inventory.is_empty() {
        toc.push_str("- [Inventory](#inventory)\n");
    }
    if !report.buyers.is_empty() {
        toc.push_str("- [Buyers](#buyers)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the dashboard stats table.
fn generate_dashboard_section(stats: &DashboardStats, currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Dashboard\n\n");
    section.push_str("| Total PCs | Listed | Sales This Month | Avg Days to Sale |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        stats.total_pcs,
        stats.listed_pcs,
        format_currency(stats.monthly_sales, currency),
        stats.avg_days_to_sale
    ));

    section
}

/// Generate the all-time sales totals.
fn generate_totals_section(totals: &MonthlyTotals, currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Sales Totals\n\n");
    section.push_str(&format!(
        "- **Total Sales:** {}\n",
        format_currency(totals.total_sales, currency)
    ));
    section.push_str(&format!(
        "- **Total Profit:** {}\n",
        format_signed_currency(totals.total_profit, currency)
    ));
    section.push_str(&format!("- **PCs Sold:** {}\n", totals.total_pcs_sold));
    section.push_str(&format!(
        "- **Average Profit:** {}\n",
        format_signed_currency(totals.average_profit, currency)
    ));
    section.push_str(&format!(
        "- **Profit Margin:** {}\n\n",
        format_percent(totals.profit_margin_percent)
    ));

    section
}

/// Generate the per-month table.
fn generate_monthly_section(months: &[MonthlySummary], currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Monthly Sales\n\n");

    if months.is_empty() {
        section.push_str("No monthly sales recorded yet.\n\n");
        return section;
    }

    section.push_str("| Month | Sales | Profit | PCs Sold | Avg Days Held | Avg Margin |\n");
    section.push_str("|:---|---:|---:|:---:|:---:|:---:|\n");

    for month in months {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            month.month_year,
            or_missing(month.total_sales, |v| format_currency(v, currency)),
            or_missing(month.total_profit, |v| format_signed_currency(v, currency)),
            month.pcs_sold,
            or_missing(month.average_days_held, |v| {
                v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_string()
            }),
            or_missing(month.average_profit_margin, format_percent)
        ));
    }
    section.push('\n');

    section
}

/// Generate the recent sales table.
fn generate_sales_section(sales: &[SaleLine], currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Recent Sales\n\n");

    if sales.is_empty() {
        section.push_str("No sales yet.\n\n");
        return section;
    }

    section.push_str("| PC | Sale Date | Price | Profit | Margin | Days Held |\n");
    section.push_str("|:---|:---:|---:|---:|:---:|:---:|\n");

    for sale in sales {
        let pc = &sale.pc;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&pc.pc_name),
            or_missing(pc.sale_date, |d| d.to_string()),
            or_missing(pc.actual_sale_price, |v| format_currency(v, currency)),
            or_missing(sale.effective_profit, |v| format_signed_currency(v, currency)),
            or_missing(sale.effective_profit_percentage, format_percent),
            or_missing(pc.days_held, |d| d.to_string())
        ));
    }
    section.push('\n');

    section
}

/// Generate the listing of every build.
fn generate_builds_section(builds: &[BuildLine], currency: &str) -> String {
    if builds.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Builds\n\n");
    section.push_str(
        "| PC | Status | Built | Intended | Cost | Sold For | Days Held | Profit | Notes |\n",
    );
    section.push_str("|:---|:---|:---:|---:|---:|---:|:---:|---:|:---|\n");

    for line in builds {
        let pc = &line.pc;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&pc.pc_name),
            pc.status,
            or_missing(pc.build_date, |d| d.to_string()),
            or_missing(pc.intended_price, |v| format_currency(v, currency)),
            or_missing(pc.total_cost, |v| format_currency(v, currency)),
            or_missing(pc.actual_sale_price, |v| format_currency(v, currency)),
            or_missing(pc.days_held, |d| d.to_string()),
            or_missing(line.effective_profit, |v| format_signed_currency(v, currency)),
            pc.notes.as_deref().map(escape_cell).unwrap_or_default()
        ));
    }
    section.push('\n');

    section
}

/// Generate the component cost table with relative bars.
fn generate_component_section(
    bars: &[ComponentCostBar],
    component_spend: Decimal,
    currency: &str,
) -> String {
    let mut section = String::new();

    section.push_str("## Component Costs\n\n");

    if bars.is_empty() {
        section.push_str("No component cost data available.\n\n");
        return section;
    }

    section.push_str("| Component | Avg Cost | Used | |\n");
    section.push_str("|:---|---:|:---:|:---|\n");

    for bar in bars {
        section.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            bar.analysis.label(),
            or_missing(bar.analysis.avg_cost, |v| format_currency(v, currency)),
            bar.analysis.total_usage,
            render_bar(bar.width_percent)
        ));
    }
    section.push('\n');

    if !component_spend.is_zero() {
        section.push_str(&format!(
            "**Total component spend:** {}\n\n",
            format_currency(component_spend, currency)
        ));
    }

    section
}

/// Generate the low stock alert list.
fn generate_low_stock_section(
    parts: &[InventoryPart],
    value: Decimal,
    threshold: u32,
    currency: &str,
) -> String {
    let mut section = String::new();

    section.push_str("## Low Stock Alert\n\n");

    if parts.is_empty() {
        section.push_str(&format!(
            "All parts are stocked above {} units.\n\n",
            threshold
        ));
        return section;
    }

    section.push_str(&format!(
        "{} part(s) at or below {} units:\n\n",
        parts.len(),
        threshold
    ));
    for part in parts {
        section.push_str(&format!(
            "- ⚠️ **{}** ({}): {} left\n",
            part.component_name, part.component_type, part.quantity_available
        ));
    }
    section.push_str(&format!(
        "\n**Stock value at risk:** {}\n\n",
        format_currency(value, currency)
    ));

    section
}

/// Generate the inventory table.
fn generate_inventory_section(parts: &[PartLine], currency: &str) -> String {
    if parts.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Inventory\n\n");
    section.push_str("| Part | Type | Qty | Buy-in | Sell | Margin |\n");
    section.push_str("|:---|:---|:---:|---:|---:|:---:|\n");

    for line in parts {
        let part = &line.part;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&part.component_name),
            escape_cell(&part.component_type),
            part.quantity_available,
            or_missing(part.buy_in_price, |v| format_currency(v, currency)),
            or_missing(part.typical_sell_price, |v| format_currency(v, currency)),
            or_missing(line.margin_percent, format_percent)
        ));
    }
    section.push('\n');

    section
}

/// Generate the buyer directory.
fn generate_buyers_section(buyers: &[Buyer]) -> String {
    if buyers.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Buyers\n\n");
    section.push_str("| Name | Contact | Email | Phone |\n");
    section.push_str("|:---|:---|:---|:---|\n");

    for buyer in buyers {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&buyer.name),
            buyer.contact.as_deref().map_or_else(|| MISSING.to_string(), escape_cell),
            buyer.email.as_deref().map_or_else(|| MISSING.to_string(), escape_cell),
            buyer.phone.as_deref().map_or_else(|| MISSING.to_string(), escape_cell)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by PcLedger v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Make free text safe inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Format a value, or the missing-data placeholder.
fn or_missing<T>(value: Option<T>, format: impl FnOnce(T) -> String) -> String {
    value.map(format).unwrap_or_else(|| MISSING.to_string())
}

/// Whole currency units with space-grouped thousands, e.g. `12 500 kr`.
pub fn format_currency(amount: Decimal, label: &str) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{} {}", sign, grouped, label)
}

/// Currency with an explicit `+` on gains.
pub fn format_signed_currency(amount: Decimal, label: &str) -> String {
    let formatted = format_currency(amount, label);
    if amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) > Decimal::ZERO {
        format!("+{}", formatted)
    } else {
        formatted
    }
}

/// Percentage with one decimal, e.g. `21.5%`.
pub fn format_percent(value: Decimal) -> String {
    format!(
        "{:.1}%",
        value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Text bar proportional to `width_percent` (0-100).
fn render_bar(width_percent: Decimal) -> String {
    let cells = (width_percent * Decimal::from(BAR_CELLS) / Decimal::ONE_HUNDRED)
        .round()
        .to_u32()
        .unwrap_or(0)
        .min(BAR_CELLS);

    format!(
        "{}{}",
        "█".repeat(cells as usize),
        "░".repeat((BAR_CELLS - cells) as usize)
    )
}
