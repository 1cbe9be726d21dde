use std::sync::Arc;

use readygate_agent::ReadinessRuntime;
use readygate_core::config::{AppConfig, ConfigError};
use readygate_core::errors::ApplicationError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<ReadinessRuntime>,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("readiness runtime wiring failed: {0}")]
    Runtime(#[from] ApplicationError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let runtime = Arc::new(ReadinessRuntime::from_config(&config)?);
    let capacity_source =
        runtime.capacity_source().map(|source| source.as_str()).unwrap_or("disabled");
    info!(
        event_name = "system.bootstrap.providers_wired",
        correlation_id = "bootstrap",
        providers = %config.enabled_providers().join(","),
        capacity_source,
        tools = runtime.tools().len(),
        "signal providers wired"
    );

    Ok(Application { config, runtime, shutdown: CancellationToken::new() })
}

#[cfg(test)]
mod tests {
    use readygate_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?)
    }

    #[test]
    fn bootstrap_fails_fast_on_invalid_thresholds() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                warning_utilization_percent: Some(140.0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let error = result.err().expect("error");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("warning_utilization_percent"), "{error}");
    }

    #[test]
    fn bootstrap_wires_runtime_from_overrides() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                service_health_enabled: Some(false),
                weather_enabled: Some(false),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed");

        assert_eq!(app.runtime.evaluator().provider_count(), 1);
        assert_eq!(app.config.enabled_providers(), ["capacity"]);
        assert!(!app.shutdown.is_cancelled());
    }
}
