use readygate_agent::ReadinessRuntime;
use readygate_core::config::{AppConfig, LoadOptions};
use readygate_core::errors::ApplicationError;
use readygate_core::readiness::capacity::CapacityThresholds;
use readygate_core::{EvaluationRequest, Recommendation, Verdict};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::commands::{CommandResult, EXIT_INVALID_INPUT, EXIT_RUNTIME_FAILURE};

const COMMAND: &str = "evaluate";

#[derive(Clone, Debug, Default)]
pub struct EvaluateArgs {
    pub target: String,
    pub location: Option<String>,
    pub subnet: Option<String>,
    pub min_required: Option<i64>,
    pub warning_utilization: Option<f64>,
    pub json: bool,
}

pub fn exit_code_for(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Go => 0,
        Verdict::Caution => 3,
        Verdict::NoGo => 4,
    }
}

pub fn run(args: EvaluateArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_INVALID_INPUT,
            );
        }
    };

    let readiness = match ReadinessRuntime::from_config(&config) {
        Ok(readiness) => readiness,
        Err(error) => return failure_for(error),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME_FAILURE,
            );
        }
    };

    let request = build_request(&args, config.evaluation.thresholds);
    let correlation_id = Uuid::new_v4().to_string();
    let cancel = CancellationToken::new();

    let outcome = runtime.block_on(async {
        let watcher = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(event_name = "cli.evaluate.interrupted", "interrupt received, cancelling");
                watcher.cancel();
            }
        });
        let outcome = readiness.evaluate(&request, &correlation_id, &cancel).await;
        interrupt.abort();
        outcome
    });

    match outcome {
        Ok(recommendation) => render(&recommendation, args.json),
        Err(error) => failure_for(error),
    }
}

fn build_request(args: &EvaluateArgs, defaults: CapacityThresholds) -> EvaluationRequest {
    let mut request = EvaluationRequest::new(args.target.clone());
    request.location = args.location.clone();
    request.subnet_hint = args.subnet.clone();
    if args.min_required.is_some() || args.warning_utilization.is_some() {
        request.thresholds = Some(CapacityThresholds {
            min_required_units: args.min_required.unwrap_or(defaults.min_required_units),
            warning_utilization_percent: args
                .warning_utilization
                .unwrap_or(defaults.warning_utilization_percent),
        });
    }
    request
}

fn render(recommendation: &Recommendation, json_output: bool) -> CommandResult {
    let exit_code = exit_code_for(recommendation.verdict());
    if !json_output {
        return CommandResult::report(exit_code, recommendation.render_text());
    }

    match serde_json::to_string_pretty(recommendation) {
        Ok(output) => CommandResult::report(exit_code, output),
        Err(error) => CommandResult::failure(
            COMMAND,
            "serialization",
            error.to_string(),
            EXIT_RUNTIME_FAILURE,
        ),
    }
}

fn failure_for(error: ApplicationError) -> CommandResult {
    match error {
        ApplicationError::Domain(error) => {
            CommandResult::failure(COMMAND, "invalid_input", error.to_string(), EXIT_INVALID_INPUT)
        }
        ApplicationError::Configuration(message) => {
            CommandResult::failure(COMMAND, "config_validation", message, EXIT_INVALID_INPUT)
        }
        ApplicationError::Cancelled => CommandResult::failure(
            COMMAND,
            "cancelled",
            ApplicationError::Cancelled.to_string(),
            EXIT_RUNTIME_FAILURE,
        ),
        ApplicationError::Integration(message) => {
            CommandResult::failure(COMMAND, "runtime_failure", message, EXIT_RUNTIME_FAILURE)
        }
    }
}
