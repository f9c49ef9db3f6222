//! HTTP client for the inventory backend.
//!
//! Read-only access to the REST endpoints the report needs. Transport
//! failures and 5xx responses are retried a bounded number of times.

use super::{Dataset, Result, SourceError};
use crate::models::{
    Buyer, Component, InventoryPart, MonthlySummary, PcBuild, PcWithComponents, ProfitAnalysis,
};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Delay before the first retry; later retries wait proportionally longer.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Client for the backend REST API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
    retries: usize,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: &str, timeout_seconds: u64, retries: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn fetch_pcs(&self) -> Result<Vec<PcBuild>> {
        self.get_json("pcs").await
    }

    /// A single build with its components.
    pub async fn fetch_pc(&self, id: Uuid) -> Result<PcWithComponents> {
        self.get_json(&format!("pcs/{}", id)).await
    }

    pub async fn fetch_inventory(&self) -> Result<Vec<InventoryPart>> {
        self.get_json("inventory").await
    }

    pub async fn fetch_buyers(&self) -> Result<Vec<Buyer>> {
        self.get_json("buyers").await
    }

    /// Builds sold to one buyer, newest sale first.
    #[allow(dead_code)]
    pub async fn fetch_buyer_purchases(&self, buyer_id: Uuid) -> Result<Vec<PcBuild>> {
        self.get_json(&format!("buyers/{}/purchases", buyer_id)).await
    }

    pub async fn fetch_monthly_summary(&self) -> Result<Vec<MonthlySummary>> {
        self.get_json("reports/monthly").await
    }

    pub async fn fetch_profit_analysis(&self) -> Result<Vec<ProfitAnalysis>> {
        self.get_json("reports/profit-analysis").await
    }

    /// Components of every given build, fetched one detail page per build.
    pub async fn fetch_components(&self, pcs: &[PcBuild]) -> Result<Vec<Component>> {
        let details = try_join_all(pcs.iter().map(|pc| self.fetch_pc(pc.id))).await?;
        Ok(details.into_iter().flat_map(|d| d.components).collect())
    }

    /// Load every collection the report needs, concurrently.
    pub async fn fetch_dataset(&self, with_components: bool) -> Result<Dataset> {
        info!("Fetching snapshot from {}", self.base_url);

        let (pcs, inventory, buyers, monthly, profit_analysis) = futures::try_join!(
            self.fetch_pcs(),
            self.fetch_inventory(),
            self.fetch_buyers(),
            self.fetch_monthly_summary(),
            self.fetch_profit_analysis()
        )?;

        let components = if with_components {
            self.fetch_components(&pcs).await?
        } else {
            Vec::new()
        };

        let dataset = Dataset {
            pcs,
            inventory,
            buyers,
            monthly,
            profit_analysis,
            components,
        };
        info!("Fetched {}", dataset.describe());

        Ok(dataset)
    }

    /// GET an endpoint and decode its JSON body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!("GET {} (attempt {})", url, attempt);

            match self.try_get(&url).await {
                Ok(value) => return Ok(value),
                Err(e) if (attempt as usize) <= self.retries && is_retryable(&e) => {
                    warn!(
                        "GET {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.retries + 1,
                        e
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Whether a failed request is worth repeating.
fn is_retryable(error: &SourceError) -> bool {
    match error {
        SourceError::Http(e) => e.is_timeout() || e.is_connect(),
        SourceError::Status { status, .. } => status.is_server_error(),
        _ => false,
    }
}
