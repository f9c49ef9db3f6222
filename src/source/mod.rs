//! Data sources for report snapshots.
//!
//! A snapshot is loaded either from the backend REST API or from a local
//! directory of JSON exports.

pub mod client;
pub mod snapshot;

pub use client::BackendClient;
pub use snapshot::SnapshotLoader;

use crate::models::{Buyer, Component, InventoryPart, MonthlySummary, PcBuild, ProfitAnalysis};

/// Errors raised while loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Missing snapshot file: {0}")]
    MissingFile(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Every collection the report is built from.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub pcs: Vec<PcBuild>,
    pub inventory: Vec<InventoryPart>,
    pub buyers: Vec<Buyer>,
    pub monthly: Vec<MonthlySummary>,
    pub profit_analysis: Vec<ProfitAnalysis>,
    /// Parts of every build; empty unless explicitly requested.
    pub components: Vec<Component>,
}

impl Dataset {
    /// One-line description of the collection sizes.
    pub fn describe(&self) -> String {
        format!(
            "{} PCs, {} parts, {} buyers, {} months, {} component types, {} components",
            self.pcs.len(),
            self.inventory.len(),
            self.buyers.len(),
            self.monthly.len(),
            self.profit_analysis.len(),
            self.components.len()
        )
    }
}
