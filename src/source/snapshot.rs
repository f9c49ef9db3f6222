//! Local snapshot directories.
//!
//! A snapshot directory holds JSON exports of the backend collections,
//! one file per endpoint. Only `pcs.json` is required; report rollups the
//! export lacks are computed from the raw records.

use super::{Dataset, Result, SourceError};
use crate::analysis::rollup;
use crate::models::{Buyer, Component, InventoryPart, PcBuild};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PCS_FILE: &str = "pcs.json";
pub const INVENTORY_FILE: &str = "inventory.json";
pub const BUYERS_FILE: &str = "buyers.json";
pub const MONTHLY_FILE: &str = "monthly.json";
pub const PROFIT_ANALYSIS_FILE: &str = "profit_analysis.json";
pub const COMPONENTS_FILE: &str = "components.json";

/// Loads a [`Dataset`] from a directory of JSON files.
pub struct SnapshotLoader {
    dir: PathBuf,
}

impl SnapshotLoader {
    /// Create a loader for a snapshot directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the snapshot, filling in missing rollups.
    pub fn load(&self) -> Result<Dataset> {
        info!("Loading snapshot from {}", self.dir.display());

        let pcs: Vec<PcBuild> = self.read_optional(PCS_FILE)?.ok_or_else(|| {
            SourceError::MissingFile(self.dir.join(PCS_FILE).display().to_string())
        })?;
        let inventory: Vec<InventoryPart> = self.read_optional(INVENTORY_FILE)?.unwrap_or_default();
        let buyers: Vec<Buyer> = self.read_optional(BUYERS_FILE)?.unwrap_or_default();
        let components: Vec<Component> = self.read_optional(COMPONENTS_FILE)?.unwrap_or_default();

        let monthly = match self.read_optional(MONTHLY_FILE)? {
            Some(rows) => rows,
            None => {
                debug!("No {}, computing monthly summary from builds", MONTHLY_FILE);
                rollup::monthly_summaries(&pcs)
            }
        };

        let profit_analysis = match self.read_optional(PROFIT_ANALYSIS_FILE)? {
            Some(rows) => rows,
            None => {
                debug!(
                    "No {}, computing component costs from {} components",
                    PROFIT_ANALYSIS_FILE,
                    components.len()
                );
                rollup::profit_analysis(&components)
            }
        };

        let dataset = Dataset {
            pcs,
            inventory,
            buyers,
            monthly,
            profit_analysis,
            components,
        };
        info!("Loaded {}", dataset.describe());

        Ok(dataset)
    }

    /// Parse `name` as a JSON array, or `None` if the file does not exist.
    fn read_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Vec<T>>> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let rows = serde_json::from_str(&content).map_err(|source| SourceError::Json {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    const PCS: &str = r#"[
        {"id": "7f1c0e0a-3b0e-4a59-9d1e-0d1f5c7a9a11", "pc_name": "Budget Gamer",
         "status": "sold", "sale_date": "2024-05-01", "actual_sale_price": 5000,
         "total_cost": 4000, "days_held": 9},
        {"id": "7f1c0e0a-3b0e-4a59-9d1e-0d1f5c7a9a12", "pc_name": "Office Box",
         "status": "listed", "intended_price": 3000}
    ]"#;

    const COMPONENTS: &str = r#"[
        {"id": "0b6a3f0e-0001-4a59-9d1e-0d1f5c7a9a11", "pc_id": "7f1c0e0a-3b0e-4a59-9d1e-0d1f5c7a9a11",
         "component_type": "Gpu", "component_name": "RTX 3060", "cost": 2500},
        {"id": "0b6a3f0e-0002-4a59-9d1e-0d1f5c7a9a11", "pc_id": "7f1c0e0a-3b0e-4a59-9d1e-0d1f5c7a9a11",
         "component_type": "Cpu", "component_name": "Ryzen 5 5600", "cost": 1500}
    ]"#;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_load_minimal_snapshot() {
        let dir = TempDir::new().unwrap();
        write(&dir, PCS_FILE, PCS);

        let dataset = SnapshotLoader::new(dir.path().to_path_buf()).load().unwrap();
        assert_eq!(dataset.pcs.len(), 2);
        assert!(dataset.inventory.is_empty());
        assert!(dataset.buyers.is_empty());
        assert!(dataset.profit_analysis.is_empty());

        // Computed from the one sold build
        assert_eq!(dataset.monthly.len(), 1);
        assert_eq!(dataset.monthly[0].month_year, "2024-05");
        assert_eq!(dataset.monthly[0].total_profit, Some(dec!(1000)));
    }

    #[test]
    fn test_load_computes_profit_analysis_from_components() {
        let dir = TempDir::new().unwrap();
        write(&dir, PCS_FILE, PCS);
        write(&dir, COMPONENTS_FILE, COMPONENTS);

        let dataset = SnapshotLoader::new(dir.path().to_path_buf()).load().unwrap();
        assert_eq!(dataset.components.len(), 2);
        assert_eq!(dataset.profit_analysis.len(), 2);
        assert_eq!(dataset.profit_analysis[0].component_type, "GPU");
    }

    #[test]
    fn test_load_prefers_exported_rollups() {
        let dir = TempDir::new().unwrap();
        write(&dir, PCS_FILE, PCS);
        write(&dir, MONTHLY_FILE, "[]");
        write(
            &dir,
            PROFIT_ANALYSIS_FILE,
            r#"[{"component_type": "psu", "avg_cost": 800, "total_usage": 4}]"#,
        );

        let dataset = SnapshotLoader::new(dir.path().to_path_buf()).load().unwrap();
        assert!(dataset.monthly.is_empty());
        assert_eq!(dataset.profit_analysis[0].total_usage, 4);
    }

    #[test]
    fn test_load_bundled_fixture() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/snapshot");
        let dataset = SnapshotLoader::new(dir).load().unwrap();

        assert_eq!(dataset.pcs.len(), 5);
        assert_eq!(dataset.inventory.len(), 4);
        assert_eq!(dataset.buyers.len(), 2);
        assert_eq!(dataset.components.len(), 6);

        // 2024-05 and 2024-04, newest first
        assert_eq!(dataset.monthly.len(), 2);
        assert_eq!(dataset.monthly[0].month_year, "2024-05");
        assert_eq!(dataset.monthly[0].pcs_sold, 2);
        assert_eq!(dataset.monthly[0].total_sales, Some(dec!(16700)));
        assert_eq!(dataset.monthly[1].total_profit, Some(dec!(1550)));

        assert_eq!(dataset.profit_analysis[0].component_type, "GPU");
        assert_eq!(dataset.profit_analysis[0].total_usage, 2);
    }

    #[test]
    fn test_missing_pcs_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, BUYERS_FILE, "[]");

        let err = SnapshotLoader::new(dir.path().to_path_buf())
            .load()
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingFile(_)));
    }

    #[test]
    fn test_invalid_json_names_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, PCS_FILE, PCS);
        write(&dir, INVENTORY_FILE, "{ not json");

        let err = SnapshotLoader::new(dir.path().to_path_buf())
            .load()
            .unwrap_err();
        assert!(err.to_string().contains(INVENTORY_FILE));
    }
}
