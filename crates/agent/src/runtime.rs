use std::sync::Arc;
use std::time::Duration;

use readygate_core::config::AppConfig;
use readygate_core::errors::ApplicationError;
use readygate_core::{CapacitySource, EvaluationRequest, Recommendation};
use tokio_util::sync::CancellationToken;

use crate::evaluator::ReadinessEvaluator;
use crate::providers::ConfiguredProviders;
use crate::tools::{
    CheckAwsStatusTool, CheckSubnetCapacityTool, EvaluateReadinessTool, ToolRegistry,
    WeatherForecastTool,
};

/// Evaluator plus tool registry, wired once from configuration and shared by
/// every caller surface.
pub struct ReadinessRuntime {
    evaluator: Arc<ReadinessEvaluator>,
    tools: ToolRegistry,
    capacity_source: Option<CapacitySource>,
}

impl ReadinessRuntime {
    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let providers = ConfiguredProviders::from_config(config)?;
        let evaluator = Arc::new(
            ReadinessEvaluator::new(providers.ordered())
                .with_deadline(Duration::from_secs(config.evaluation.deadline_secs))
                .with_default_thresholds(config.evaluation.thresholds),
        );

        let mut tools = ToolRegistry::default();
        if let Some(provider) = &providers.service_health {
            tools.register(CheckAwsStatusTool::new(Arc::clone(provider)));
        }
        if let Some(provider) = &providers.capacity {
            tools.register(CheckSubnetCapacityTool::new(
                Arc::clone(provider),
                config.evaluation.thresholds,
            ));
        }
        if let Some(provider) = &providers.environmental {
            tools.register(WeatherForecastTool::new(Arc::clone(provider)));
        }
        tools.register(EvaluateReadinessTool::new(Arc::clone(&evaluator)));

        let capacity_source = config.ipam.enabled.then(|| config.ipam.source());
        Ok(Self { evaluator, tools, capacity_source })
    }

    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        correlation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Recommendation, ApplicationError> {
        self.evaluator.evaluate(request, correlation_id, cancel).await
    }

    pub fn evaluator(&self) -> &ReadinessEvaluator {
        &self.evaluator
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// `None` when the capacity provider is disabled.
    pub fn capacity_source(&self) -> Option<CapacitySource> {
        self.capacity_source
    }
}
