use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use readygate_core::errors::ApplicationError;
use readygate_core::readiness::capacity::CapacityThresholds;
use readygate_core::readiness::decide;
use readygate_core::{EvaluationRequest, Recommendation, SignalResult};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::providers::{SignalProvider, SignalQuery};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15);

/// Fans a request out to every applicable provider and folds the answers.
pub struct ReadinessEvaluator {
    providers: Vec<Arc<dyn SignalProvider>>,
    deadline: Duration,
    default_thresholds: CapacityThresholds,
}

impl ReadinessEvaluator {
    pub fn new(providers: Vec<Arc<dyn SignalProvider>>) -> Self {
        Self {
            providers,
            deadline: DEFAULT_DEADLINE,
            default_thresholds: CapacityThresholds::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_default_thresholds(mut self, thresholds: CapacityThresholds) -> Self {
        self.default_thresholds = thresholds;
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn default_thresholds(&self) -> CapacityThresholds {
        self.default_thresholds
    }

    /// Validation happens before any provider is called. Cancellation wins
    /// over in-flight providers and yields no partial recommendation.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        correlation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Recommendation, ApplicationError> {
        request.validate()?;
        let thresholds = request.thresholds.unwrap_or(self.default_thresholds);
        thresholds.validate()?;

        let deadline = Instant::now() + self.deadline;
        let pending = self.providers.iter().filter_map(|provider| {
            let target = request.target_for(provider.kind())?;
            let query = SignalQuery::new(target, thresholds);
            Some(self.run_provider(provider.as_ref(), query, deadline, correlation_id))
        });

        let signals = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(
                    event_name = "readiness.evaluation.cancelled",
                    correlation_id = %correlation_id,
                    target = %request.target,
                    "readiness evaluation cancelled"
                );
                return Err(ApplicationError::Cancelled);
            }
            signals = join_all(pending) => signals,
        };

        let recommendation = decide(signals);
        info!(
            event_name = "readiness.evaluation.completed",
            correlation_id = %correlation_id,
            target = %request.target,
            verdict = %recommendation.verdict(),
            signals = recommendation.signals().len(),
            "readiness evaluation completed"
        );
        Ok(recommendation)
    }

    async fn run_provider(
        &self,
        provider: &dyn SignalProvider,
        query: SignalQuery,
        deadline: Instant,
        correlation_id: &str,
    ) -> SignalResult {
        let kind = provider.kind();
        let started = Instant::now();

        match timeout_at(deadline, provider.evaluate(&query)).await {
            Ok(signal) => {
                info!(
                    event_name = "readiness.provider.completed",
                    correlation_id = %correlation_id,
                    provider = %kind,
                    target = %query.target,
                    state = %signal.state,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "signal provider completed"
                );
                signal
            }
            Err(_) => {
                warn!(
                    event_name = "readiness.provider.timeout",
                    correlation_id = %correlation_id,
                    provider = %kind,
                    target = %query.target,
                    deadline_secs = self.deadline.as_secs(),
                    "signal provider exceeded the evaluation deadline"
                );
                SignalResult::unknown(
                    kind,
                    query.target.clone(),
                    format!("timed out after {}s", self.deadline.as_secs()),
                )
            }
        }
    }
}
