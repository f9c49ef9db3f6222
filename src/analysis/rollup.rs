//! Local rollups of raw records.
//!
//! The backend computes the monthly summary and the component cost
//! analysis itself. These functions produce the same rows from a snapshot
//! of builds and components, and fill in profit figures the backend left
//! out. Values the backend did supply always win.

use crate::models::{Component, ComponentType, InventoryPart, MonthlySummary, PcBuild, ProfitAnalysis};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Profit of a build: the stored value, or sale price minus total cost.
pub fn effective_profit(pc: &PcBuild) -> Option<Decimal> {
    pc.profit.or_else(|| Some(pc.actual_sale_price? - pc.total_cost?))
}

/// Profit as a percentage of total cost; `None` unless cost is positive.
pub fn effective_profit_percentage(pc: &PcBuild) -> Option<Decimal> {
    if pc.profit_percentage.is_some() {
        return pc.profit_percentage;
    }

    let cost = pc.total_cost.filter(|c| *c > Decimal::ZERO)?;
    effective_profit(pc)?
        .checked_div(cost)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Cost basis of a build from its parts.
pub fn total_component_cost(components: &[Component]) -> Decimal {
    components.iter().map(|c| c.cost).sum()
}

/// Buy-in value of the given parts at their current quantities.
pub fn low_stock_value(parts: &[InventoryPart]) -> Decimal {
    parts
        .iter()
        .map(|p| p.buy_in_price.unwrap_or_default() * Decimal::from(p.quantity_available))
        .sum()
}

/// Group sold builds by sale month, newest month first.
///
/// Builds without a sale date are ignored. Sums and averages over months
/// where no build carries the value are `None`.
pub fn monthly_summaries(pcs: &[PcBuild]) -> Vec<MonthlySummary> {
    let mut by_month: BTreeMap<String, Vec<&PcBuild>> = BTreeMap::new();

    for pc in pcs {
        if let Some(date) = pc.sale_date {
            by_month
                .entry(date.format("%Y-%m").to_string())
                .or_default()
                .push(pc);
        }
    }

    by_month
        .into_iter()
        .rev()
        .map(|(month_year, month)| MonthlySummary {
            month_year,
            total_sales: sum_present(month.iter().map(|pc| pc.actual_sale_price)),
            total_profit: sum_present(month.iter().map(|pc| effective_profit(pc))),
            pcs_sold: month.len() as u64,
            average_days_held: mean_present(
                month.iter().map(|pc| pc.days_held.map(Decimal::from)),
            ),
            average_profit_margin: mean_present(
                month.iter().map(|pc| effective_profit_percentage(pc)),
            ),
        })
        .collect()
}

/// Average cost and usage per component type, most expensive first.
pub fn profit_analysis(components: &[Component]) -> Vec<ProfitAnalysis> {
    let mut by_type: BTreeMap<ComponentType, Vec<Decimal>> = BTreeMap::new();

    for component in components {
        by_type
            .entry(component.component_type)
            .or_default()
            .push(component.cost);
    }

    let mut rows: Vec<ProfitAnalysis> = by_type
        .into_iter()
        .map(|(component_type, costs)| {
            let avg_cost = mean_present(costs.iter().copied().map(Some));
            ProfitAnalysis {
                component_type: component_type.to_string(),
                avg_cost,
                total_usage: costs.len() as u64,
                avg_profit_contribution: avg_cost,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.avg_cost
            .unwrap_or_default()
            .cmp(&a.avg_cost.unwrap_or_default())
    });
    rows
}

fn sum_present(values: impl Iterator<Item = Option<Decimal>>) -> Option<Decimal> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or_default() + v))
}

fn mean_present(values: impl Iterator<Item = Option<Decimal>>) -> Option<Decimal> {
    let present: Vec<Decimal> = values.flatten().collect();
    if present.is_empty() {
        return None;
    }

    let total: Decimal = present.iter().sum();
    total.checked_div(Decimal::from(present.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PcStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn create_sale(
        sale_date: &str,
        price: Option<Decimal>,
        cost: Option<Decimal>,
        days_held: Option<i32>,
    ) -> PcBuild {
        let mut pc = PcBuild::new("Sold build", PcStatus::Sold);
        pc.sale_date = NaiveDate::parse_from_str(sale_date, "%Y-%m-%d").ok();
        pc.actual_sale_price = price;
        pc.total_cost = cost;
        pc.days_held = days_held;
        pc
    }

    fn create_component(component_type: ComponentType, cost: Decimal) -> Component {
        Component {
            id: Uuid::new_v4(),
            pc_id: Uuid::nil(),
            component_type,
            component_name: format!("{} part", component_type),
            cost,
            notes: None,
        }
    }

    #[test]
    fn test_effective_profit_prefers_stored_value() {
        let mut pc = create_sale("2024-05-01", Some(dec!(5000)), Some(dec!(4000)), None);
        assert_eq!(effective_profit(&pc), Some(dec!(1000)));

        pc.profit = Some(dec!(900));
        assert_eq!(effective_profit(&pc), Some(dec!(900)));
    }

    #[test]
    fn test_effective_profit_missing_data() {
        let no_price = create_sale("2024-05-01", None, Some(dec!(4000)), None);
        let no_cost = create_sale("2024-05-01", Some(dec!(5000)), None, None);

        assert_eq!(effective_profit(&no_price), None);
        assert_eq!(effective_profit(&no_cost), None);
    }

    #[test]
    fn test_effective_profit_percentage() {
        let pc = create_sale("2024-05-01", Some(dec!(5000)), Some(dec!(4000)), None);
        assert_eq!(effective_profit_percentage(&pc), Some(dec!(25)));

        let loss = create_sale("2024-05-01", Some(dec!(3000)), Some(dec!(4000)), None);
        assert_eq!(effective_profit_percentage(&loss), Some(dec!(-25)));

        let zero_cost = create_sale("2024-05-01", Some(dec!(5000)), Some(Decimal::ZERO), None);
        assert_eq!(effective_profit_percentage(&zero_cost), None);

        let mut stored = pc.clone();
        stored.profit_percentage = Some(dec!(12.5));
        assert_eq!(effective_profit_percentage(&stored), Some(dec!(12.5)));
    }

    #[test]
    fn test_total_component_cost() {
        let components = vec![
            create_component(ComponentType::Cpu, dec!(1500)),
            create_component(ComponentType::Gpu, dec!(2800.50)),
            create_component(ComponentType::Case, dec!(499.50)),
        ];

        assert_eq!(total_component_cost(&components), dec!(4800));
        assert_eq!(total_component_cost(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_low_stock_value() {
        let part = |price: Option<Decimal>, quantity: u32| InventoryPart {
            id: Uuid::new_v4(),
            component_type: "RAM".to_string(),
            component_name: "DDR4".to_string(),
            buy_in_price: price,
            typical_sell_price: None,
            quantity_available: quantity,
            notes: None,
            purchase_link: None,
        };

        let parts = vec![part(Some(dec!(350)), 2), part(None, 5), part(Some(dec!(99)), 0)];
        assert_eq!(low_stock_value(&parts), dec!(700));
    }

    #[test]
    fn test_monthly_summaries() {
        let pcs = vec![
            create_sale("2024-04-10", Some(dec!(5000)), Some(dec!(4000)), Some(10)),
            create_sale("2024-05-02", Some(dec!(6000)), Some(dec!(4500)), Some(3)),
            create_sale("2024-04-28", Some(dec!(3000)), Some(dec!(2000)), Some(20)),
            create_sale("2024-05-20", None, None, None),
            PcBuild::new("Not sold", PcStatus::Listed),
        ];

        let summaries = monthly_summaries(&pcs);
        assert_eq!(summaries.len(), 2);

        let may = &summaries[0];
        assert_eq!(may.month_year, "2024-05");
        assert_eq!(may.pcs_sold, 2);
        assert_eq!(may.total_sales, Some(dec!(6000)));
        assert_eq!(may.total_profit, Some(dec!(1500)));
        assert_eq!(may.average_days_held, Some(dec!(3)));

        let april = &summaries[1];
        assert_eq!(april.month_year, "2024-04");
        assert_eq!(april.pcs_sold, 2);
        assert_eq!(april.total_sales, Some(dec!(8000)));
        assert_eq!(april.total_profit, Some(dec!(2000)));
        assert_eq!(april.average_days_held, Some(dec!(15)));
        // (25% + 50%) / 2
        assert_eq!(april.average_profit_margin, Some(dec!(37.5)));
    }

    #[test]
    fn test_monthly_summaries_all_missing() {
        let pcs = vec![create_sale("2024-01-15", None, None, None)];

        let summaries = monthly_summaries(&pcs);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_sales, None);
        assert_eq!(summaries[0].total_profit, None);
        assert_eq!(summaries[0].average_days_held, None);
        assert_eq!(summaries[0].pcs_sold, 1);
    }

    #[test]
    fn test_profit_analysis() {
        let components = vec![
            create_component(ComponentType::Ram, dec!(400)),
            create_component(ComponentType::Gpu, dec!(3000)),
            create_component(ComponentType::Ram, dec!(600)),
            create_component(ComponentType::Gpu, dec!(2000)),
            create_component(ComponentType::Case, dec!(700)),
        ];

        let rows = profit_analysis(&components);
        let types: Vec<_> = rows.iter().map(|r| r.component_type.as_str()).collect();
        assert_eq!(types, vec!["GPU", "Case", "RAM"]);

        assert_eq!(rows[0].avg_cost, Some(dec!(2500)));
        assert_eq!(rows[0].total_usage, 2);
        assert_eq!(rows[2].avg_cost, Some(dec!(500)));
        assert_eq!(rows[2].avg_profit_contribution, rows[2].avg_cost);
    }
}
