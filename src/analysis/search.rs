//! Free-text and type filters shared by every record listing.

use crate::models::{Buyer, ComponentType, InventoryPart, PcBuild};

/// Selector value that disables the component-type filter.
pub const ALL_TYPES: &str = "all";

/// A record that can be matched against a search term.
pub trait Searchable {
    /// The text fields a search term is matched against. Absent optional
    /// fields are simply left out.
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Buyer {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.name.as_str()),
            self.email.as_deref(),
            self.contact.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Searchable for InventoryPart {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.component_name.as_str(), self.component_type.as_str()]
    }
}

impl Searchable for PcBuild {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.pc_name.as_str()),
            self.platform.as_deref(),
            self.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Whether any search field contains `term`, ignoring case.
///
/// An empty term matches every record.
pub fn matches_search<T: Searchable>(item: &T, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }

    let needle = term.to_lowercase();
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Keep the records matching `term`, in input order.
pub fn filter_by_search<T: Searchable + Clone>(items: &[T], term: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| matches_search(*item, term))
        .cloned()
        .collect()
}

/// Keep the parts of one component type, or all parts when the selector
/// is `"all"`. Known types match across spellings (`CpuCooler`,
/// `CPU Cooler`); anything else is compared case-insensitively.
pub fn filter_by_component_type(parts: &[InventoryPart], selected: &str) -> Vec<InventoryPart> {
    if selected.eq_ignore_ascii_case(ALL_TYPES) {
        return parts.to_vec();
    }

    let selected = type_key(selected);
    parts
        .iter()
        .filter(|part| type_key(&part.component_type) == selected)
        .cloned()
        .collect()
}

fn type_key(raw: &str) -> String {
    raw.parse::<ComponentType>()
        .map(|t| t.to_string())
        .unwrap_or_else(|_| raw.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PcStatus;
    use uuid::Uuid;

    fn create_buyer(name: &str, email: Option<&str>, contact: Option<&str>) -> Buyer {
        Buyer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            contact: contact.map(String::from),
            email: email.map(String::from),
            phone: None,
        }
    }

    fn create_part(component_type: &str, name: &str) -> InventoryPart {
        InventoryPart {
            id: Uuid::new_v4(),
            component_type: component_type.to_string(),
            component_name: name.to_string(),
            buy_in_price: None,
            typical_sell_price: None,
            quantity_available: 1,
            notes: None,
            purchase_link: None,
        }
    }

    fn sample_buyers() -> Vec<Buyer> {
        vec![
            create_buyer("Ola Nordmann", Some("ola@example.no"), None),
            create_buyer("Kari Hansen", None, Some("finn.no: kari_h")),
            create_buyer("Per Olsen", Some("per@firma.no"), Some("Discord")),
        ]
    }

    #[test]
    fn test_empty_term_returns_input() {
        let buyers = sample_buyers();
        assert_eq!(filter_by_search(&buyers, ""), buyers);
    }

    #[test]
    fn test_unmatched_term_returns_empty() {
        let buyers = sample_buyers();
        assert!(filter_by_search(&buyers, "zzz-no-match").is_empty());
    }

    #[test]
    fn test_buyer_search_fields() {
        let buyers = sample_buyers();

        let by_name = filter_by_search(&buyers, "HANSEN");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Kari Hansen");

        let by_email = filter_by_search(&buyers, "firma");
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].name, "Per Olsen");

        let by_contact = filter_by_search(&buyers, "finn.no");
        assert_eq!(by_contact.len(), 1);
        assert_eq!(by_contact[0].name, "Kari Hansen");
    }

    #[test]
    fn test_search_preserves_order_and_is_idempotent() {
        let buyers = sample_buyers();

        let once = filter_by_search(&buyers, "ol");
        let twice = filter_by_search(&once, "ol");
        assert_eq!(once, twice);

        let names: Vec<_> = once.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Ola Nordmann", "Per Olsen"]);
    }

    #[test]
    fn test_part_search_matches_type_and_name() {
        let parts = vec![
            create_part("GPU", "RTX 3070"),
            create_part("CPU", "Ryzen 5 5600X"),
            create_part("RAM", "Corsair 16GB"),
        ];

        assert_eq!(filter_by_search(&parts, "gpu").len(), 1);
        assert_eq!(filter_by_search(&parts, "ryzen")[0].component_type, "CPU");
        assert_eq!(filter_by_search(&parts, "r").len(), 3);
    }

    #[test]
    fn test_pc_search_fields() {
        let mut pc = PcBuild::new("White Streamer", PcStatus::Listed);
        pc.platform = Some("FINN".to_string());

        assert!(matches_search(&pc, "streamer"));
        assert!(matches_search(&pc, "finn"));
        assert!(!matches_search(&pc, "ebay"));
    }

    #[test]
    fn test_filter_by_component_type() {
        let parts = vec![
            create_part("GPU", "RTX 3070"),
            create_part("gpu", "RX 6700"),
            create_part("CPU", "i5-12400F"),
        ];

        assert_eq!(filter_by_component_type(&parts, "Gpu").len(), 2);
        assert_eq!(filter_by_component_type(&parts, "ALL"), parts);
        assert!(filter_by_component_type(&parts, "PSU").is_empty());
    }

    #[test]
    fn test_filter_by_component_type_spellings() {
        let parts = vec![
            create_part("CpuCooler", "Noctua NH-U12S"),
            create_part("CPU Cooler", "Arctic Freezer 34"),
            create_part("Fan", "Arctic P12"),
        ];

        assert_eq!(filter_by_component_type(&parts, "cpu_cooler").len(), 2);
        assert_eq!(filter_by_component_type(&parts, "FAN").len(), 1);
    }
}
