use async_trait::async_trait;
use readygate_core::readiness::capacity::{capacity_not_found, capacity_signal, CapacitySource};
use readygate_core::{CapacityCounts, SignalKind, SignalResult, StaticInventory};
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::{numeric, FetchError, SignalProvider, SignalQuery};

/// Sums subnet utilization reported by an IPAM service for a target tag.
pub struct IpamCapacityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl IpamCapacityProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self { client, base_url: base_url.into(), api_key }
    }

    async fn fetch_counts(&self, target: &str) -> Result<Option<CapacityCounts>, FetchError> {
        let filter = subnet_filter(target)?;
        let url = format!("{}/ipam/subnet", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Token {}", self.api_key.expose_secret()))
            .query(&[("_filter", filter.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: Value = response.json().await?;
        subnet_counts(&body)
    }
}

/// Targets are embedded in single-quoted filter literals, so quotes and
/// backslashes are refused rather than escaped.
fn subnet_filter(target: &str) -> Result<String, FetchError> {
    if target.contains(['\'', '\\']) {
        return Err(FetchError::UnsupportedTarget(target.to_string()));
    }
    Ok(format!("tags~'{target}' or comment~'{target}'"))
}

/// `None` when the inventory holds no subnet for the target.
fn subnet_counts(body: &Value) -> Result<Option<CapacityCounts>, FetchError> {
    let results =
        body.get("results").and_then(Value::as_array).ok_or(FetchError::MissingField("results"))?;
    if results.is_empty() {
        return Ok(None);
    }

    let mut counts = CapacityCounts::default();
    for subnet in results {
        let utilization = subnet
            .get("utilization")
            .filter(|utilization| utilization.is_object())
            .ok_or(FetchError::MissingField("utilization"))?;
        counts = counts.combine(CapacityCounts::new(
            count_field(utilization, "utilization.total")?,
            count_field(utilization, "utilization.used")?,
            count_field(utilization, "utilization.available")?,
        ));
    }
    Ok(Some(counts))
}

fn count_field(utilization: &Value, path: &'static str) -> Result<u64, FetchError> {
    let key = path.strip_prefix("utilization.").unwrap_or(path);
    match utilization.get(key) {
        None | Some(Value::Null) => Err(FetchError::MissingField(path)),
        Some(value) => numeric(value)
            .filter(|count| count.is_finite() && *count >= 0.0)
            .map(|count| count as u64)
            .ok_or_else(|| FetchError::Malformed(format!("{path} is not a count"))),
    }
}

#[async_trait]
impl SignalProvider for IpamCapacityProvider {
    fn kind(&self) -> SignalKind {
        SignalKind::Capacity
    }

    async fn evaluate(&self, query: &SignalQuery) -> SignalResult {
        match self.fetch_counts(&query.target).await {
            Ok(Some(counts)) => {
                capacity_signal(&query.target, &counts, &query.thresholds, CapacitySource::Live)
            }
            Ok(None) => capacity_not_found(&query.target, CapacitySource::Live),
            Err(error) => error.into_signal(self.kind(), &query.target),
        }
    }
}

/// Answers from a fixed table when no IPAM credentials are configured.
pub struct StaticCapacityProvider {
    inventory: StaticInventory,
}

impl StaticCapacityProvider {
    pub fn new(inventory: StaticInventory) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl SignalProvider for StaticCapacityProvider {
    fn kind(&self) -> SignalKind {
        SignalKind::Capacity
    }

    async fn evaluate(&self, query: &SignalQuery) -> SignalResult {
        match self.inventory.lookup(&query.target) {
            Some(counts) => capacity_signal(
                &query.target,
                &counts,
                &query.thresholds,
                CapacitySource::Simulated,
            ),
            None => capacity_not_found(&query.target, CapacitySource::Simulated),
        }
    }
}
