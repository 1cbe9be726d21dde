use async_trait::async_trait;
use readygate_core::readiness::weather::weather_signal;
use readygate_core::{SignalKind, SignalResult, WeatherObservation, WeatherThresholds};
use reqwest::Url;
use serde_json::Value;

use super::{numeric, FetchError, SignalProvider, SignalQuery};

/// Current conditions from a wttr.in-compatible JSON endpoint.
///
/// With `thresholds == None` the observation is reported as advisory context
/// and takes no part in the verdict.
pub struct WeatherProvider {
    client: reqwest::Client,
    base_url: String,
    thresholds: Option<WeatherThresholds>,
}

impl WeatherProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        thresholds: Option<WeatherThresholds>,
    ) -> Self {
        Self { client, base_url: base_url.into(), thresholds }
    }

    fn location_url(&self, location: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|error| FetchError::Malformed(format!("weather base url: {error}")))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::Malformed("weather base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(location);
        url.query_pairs_mut().append_pair("format", "j1");
        Ok(url)
    }

    async fn fetch_observation(&self, location: &str) -> Result<WeatherObservation, FetchError> {
        let url = self.location_url(location)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body: Value = response.json().await?;
        parse_observation(&body)
    }
}

fn parse_observation(body: &Value) -> Result<WeatherObservation, FetchError> {
    let current = body
        .get("current_condition")
        .and_then(Value::as_array)
        .and_then(|conditions| conditions.first())
        .ok_or(FetchError::MissingField("current_condition"))?;

    let required = |field: &'static str| {
        current.get(field).and_then(numeric).ok_or(FetchError::MissingField(field))
    };
    let optional = |field: &str| current.get(field).and_then(numeric);

    let description = current
        .get("weatherDesc")
        .and_then(Value::as_array)
        .and_then(|descriptions| descriptions.first())
        .and_then(|entry| entry.get("value"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(WeatherObservation {
        temperature_c: required("temp_C")?,
        wind_speed_kmph: required("windspeedKmph")?,
        description,
        temperature_f: optional("temp_F"),
        humidity_percent: optional("humidity"),
        visibility_km: optional("visibility"),
        uv_index: optional("uvIndex"),
    })
}

#[async_trait]
impl SignalProvider for WeatherProvider {
    fn kind(&self) -> SignalKind {
        SignalKind::Environmental
    }

    async fn evaluate(&self, query: &SignalQuery) -> SignalResult {
        match self.fetch_observation(&query.target).await {
            Ok(observation) => weather_signal(&query.target, &observation, self.thresholds.as_ref()),
            Err(error) => error.into_signal(self.kind(), &query.target),
        }
    }
}
