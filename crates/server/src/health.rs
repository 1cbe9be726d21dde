use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use readygate_agent::ReadinessRuntime;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    runtime: Arc<ReadinessRuntime>,
    providers: Vec<&'static str>,
}

impl HealthState {
    pub fn new(runtime: Arc<ReadinessRuntime>, providers: Vec<&'static str>) -> Self {
        Self { runtime, providers }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub providers: Vec<&'static str>,
    pub capacity_source: &'static str,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = !state.providers.is_empty();
    let capacity_source =
        state.runtime.capacity_source().map(|source| source.as_str()).unwrap_or("disabled");

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("{} tools registered", state.runtime.tools().len()),
        },
        providers: state.providers.clone(),
        capacity_source,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use readygate_agent::ReadinessRuntime;
    use readygate_core::config::AppConfig;

    use crate::health::{health, HealthState};

    fn state(config: &AppConfig) -> HealthState {
        let runtime = ReadinessRuntime::from_config(config).expect("runtime builds");
        HealthState::new(Arc::new(runtime), config.enabled_providers())
    }

    #[tokio::test]
    async fn health_reports_wired_providers_and_capacity_mode() {
        let (status, Json(payload)) = health(State(state(&AppConfig::default()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.providers, ["service_health", "capacity", "environmental"]);
        assert_eq!(payload.capacity_source, "simulated");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_is_degraded_without_providers() {
        let mut config = AppConfig::default();
        config.service_health.enabled = false;
        config.weather.enabled = false;
        config.ipam.enabled = false;

        let (status, Json(payload)) = health(State(state(&config))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.capacity_source, "disabled");
    }
}
