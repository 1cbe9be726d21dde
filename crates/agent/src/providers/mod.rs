//! Signal providers: one per risk dimension.
//!
//! Providers never fail. Transport errors, bad status codes and malformed
//! payloads are folded into an `unknown` signal whose detail names the cause.

pub mod capacity;
pub mod environmental;
pub mod service_health;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use readygate_core::config::{AppConfig, HttpConfig};
use readygate_core::errors::ApplicationError;
use readygate_core::readiness::capacity::{CapacitySource, CapacityThresholds};
use readygate_core::{SignalKind, SignalResult, StaticInventory};
use serde_json::Value;
use thiserror::Error;

pub use capacity::{IpamCapacityProvider, StaticCapacityProvider};
pub use environmental::WeatherProvider;
pub use service_health::StatusFeedProvider;

/// What a single provider is asked about.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalQuery {
    pub target: String,
    pub thresholds: CapacityThresholds,
}

impl SignalQuery {
    pub fn new(target: impl Into<String>, thresholds: CapacityThresholds) -> Self {
        Self { target: target.into(), thresholds }
    }
}

#[async_trait]
pub trait SignalProvider: Send + Sync {
    fn kind(&self) -> SignalKind;
    async fn evaluate(&self, query: &SignalQuery) -> SignalResult;
}

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("source unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("target `{0}` cannot be expressed in an IPAM filter")]
    UnsupportedTarget(String),
}

impl FetchError {
    pub(crate) fn into_signal(self, kind: SignalKind, target: &str) -> SignalResult {
        SignalResult::unknown(kind, target, format!("source unavailable: {self}"))
    }
}

/// Reads a count that may arrive as a JSON number or a numeric string.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn http_client(http: &HttpConfig) -> Result<reqwest::Client, ApplicationError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(http.timeout_secs))
        .user_agent(http.user_agent.clone())
        .build()
        .map_err(|error| ApplicationError::Configuration(format!("http client: {error}")))
}

/// Providers enabled by configuration, one slot per dimension.
#[derive(Clone, Default)]
pub struct ConfiguredProviders {
    pub service_health: Option<Arc<dyn SignalProvider>>,
    pub capacity: Option<Arc<dyn SignalProvider>>,
    pub environmental: Option<Arc<dyn SignalProvider>>,
}

impl ConfiguredProviders {
    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let client = http_client(&config.http)?;
        let mut providers = Self::default();

        if config.service_health.enabled {
            providers.service_health = Some(Arc::new(StatusFeedProvider::new(
                client.clone(),
                config.service_health.feed_url.clone(),
                config.service_health.recency_hours,
            )));
        }

        if config.ipam.enabled {
            let capacity: Arc<dyn SignalProvider> = match (config.ipam.source(), &config.ipam.api_key)
            {
                (CapacitySource::Live, Some(api_key)) => Arc::new(IpamCapacityProvider::new(
                    client.clone(),
                    config.ipam.base_url.clone(),
                    api_key.clone(),
                )),
                _ => Arc::new(StaticCapacityProvider::new(StaticInventory::builtin())),
            };
            providers.capacity = Some(capacity);
        }

        if config.weather.enabled {
            let thresholds = config.weather.classify.then(|| config.weather.thresholds.clone());
            providers.environmental = Some(Arc::new(WeatherProvider::new(
                client,
                config.weather.base_url.clone(),
                thresholds,
            )));
        }

        Ok(providers)
    }

    /// Registration order, which is also the order of reasons in a recommendation.
    pub fn ordered(&self) -> Vec<Arc<dyn SignalProvider>> {
        [&self.service_health, &self.capacity, &self.environmental]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use readygate_core::config::AppConfig;
    use readygate_core::SignalKind;
    use serde_json::json;

    use super::{numeric, ConfiguredProviders};

    #[test]
    fn numeric_accepts_numbers_and_numeric_strings() {
        assert_eq!(numeric(&json!(256)), Some(256.0));
        assert_eq!(numeric(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(numeric(&json!("n/a")), None);
        assert_eq!(numeric(&json!(null)), None);
    }

    #[test]
    fn providers_are_ordered_by_dimension() {
        let providers =
            ConfiguredProviders::from_config(&AppConfig::default()).expect("default config wires");
        let kinds = providers.ordered().iter().map(|p| p.kind()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [SignalKind::ServiceHealth, SignalKind::Capacity, SignalKind::Environmental]
        );
    }

    #[test]
    fn disabled_providers_are_not_wired() {
        let mut config = AppConfig::default();
        config.service_health.enabled = false;
        config.weather.enabled = false;

        let providers = ConfiguredProviders::from_config(&config).expect("config wires");
        let kinds = providers.ordered().iter().map(|p| p.kind()).collect::<Vec<_>>();
        assert_eq!(kinds, [SignalKind::Capacity]);
    }
}
