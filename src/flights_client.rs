use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::flights::{FlightFilter, FlightRecord};

/// Upstream datastore settings, passed in at construction so tests can point
/// the client at a mock endpoint. One fixed resource and row limit; there is
/// no pagination, so rows beyond `limit` are not visible through this API.
#[derive(Debug, Clone)]
pub struct FlightDataConfig {
    pub base_url: String,
    pub resource_id: String,
    pub limit: u32,
    /// Optional per-request timeout. The baseline contract has none: a hung
    /// upstream hangs the request.
    pub timeout: Option<Duration>,
}

impl Default for FlightDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.gov.il/api/3/action/datastore_search".to_string(),
            resource_id: "e83f763b-b7d7-479e-b172-ae981ddc6de5".to_string(),
            limit: 300,
            timeout: None,
        }
    }
}

/// Datastore response envelope: `{ "result": { "records": [...] } }`.
#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    result: DatastoreResult,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    records: Vec<FlightRecord>,
}

/// Client for the flight board datastore.
#[derive(Clone)]
pub struct FlightDataClient {
    client: Client,
    config: FlightDataConfig,
}

impl FlightDataClient {
    pub fn new(config: FlightDataConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Fetch the current flight page and apply `filter`.
    ///
    /// Issues exactly one request per call; every caller sees a fresh
    /// snapshot and no state is shared between calls. Records come back in
    /// upstream order.
    pub async fn fetch_flights(&self, filter: &FlightFilter) -> Result<Vec<FlightRecord>> {
        debug!(
            "Fetching flight board (resource {}, limit {})",
            self.config.resource_id, self.config.limit
        );

        let limit = self.config.limit.to_string();
        let mut request = self.client.get(&self.config.base_url).query(&[
            ("resource_id", self.config.resource_id.as_str()),
            ("limit", limit.as_str()),
        ]);

        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to flight board datastore")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Flight board datastore error {}: {}", status, body));
        }

        let envelope: DatastoreResponse = response
            .json()
            .await
            .context("Failed to parse flight board datastore response")?;

        let total = envelope.result.records.len();
        let records = filter.apply(envelope.result.records);
        info!(
            "Fetched {} flight records ({} after {:?} filter)",
            total,
            records.len(),
            filter.direction
        );

        Ok(records)
    }
}
