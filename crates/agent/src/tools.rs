use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use readygate_core::readiness::capacity::CapacityThresholds;
use readygate_core::EvaluationRequest;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::evaluator::ReadinessEvaluator;
use crate::providers::{SignalProvider, SignalQuery};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self.tools.get(name).ok_or_else(|| anyhow!("unknown tool `{name}`"))?;
        tool.execute(input).await.with_context(|| format!("tool `{name}` failed"))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.tools.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T> {
    serde_json::from_value(input).context("malformed tool input")
}

#[derive(Deserialize)]
struct RegionInput {
    region: String,
}

#[derive(Deserialize)]
struct SubnetCapacityInput {
    region: String,
    #[serde(default)]
    min_required_ips: Option<i64>,
}

#[derive(Deserialize)]
struct CityInput {
    city: String,
}

#[derive(Deserialize)]
struct ReadinessInput {
    target: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    subnet_hint: Option<String>,
    #[serde(default)]
    min_required_ips: Option<i64>,
}

fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("`{field}` must not be empty"));
    }
    Ok(trimmed)
}

pub struct CheckAwsStatusTool {
    provider: Arc<dyn SignalProvider>,
}

impl CheckAwsStatusTool {
    pub fn new(provider: Arc<dyn SignalProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for CheckAwsStatusTool {
    fn name(&self) -> &'static str {
        "check_aws_status"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: RegionInput = parse_input(input)?;
        let region = require_non_blank("region", &input.region)?;
        let signal =
            self.provider.evaluate(&SignalQuery::new(region, CapacityThresholds::default())).await;
        Ok(serde_json::to_value(signal)?)
    }
}

pub struct CheckSubnetCapacityTool {
    provider: Arc<dyn SignalProvider>,
    defaults: CapacityThresholds,
}

impl CheckSubnetCapacityTool {
    pub fn new(provider: Arc<dyn SignalProvider>, defaults: CapacityThresholds) -> Self {
        Self { provider, defaults }
    }
}

#[async_trait]
impl Tool for CheckSubnetCapacityTool {
    fn name(&self) -> &'static str {
        "check_subnet_capacity"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: SubnetCapacityInput = parse_input(input)?;
        let region = require_non_blank("region", &input.region)?;
        let thresholds = thresholds_with_minimum(self.defaults, input.min_required_ips);
        thresholds.validate()?;

        let signal = self.provider.evaluate(&SignalQuery::new(region, thresholds)).await;
        Ok(serde_json::to_value(signal)?)
    }
}

pub struct WeatherForecastTool {
    provider: Arc<dyn SignalProvider>,
}

impl WeatherForecastTool {
    pub fn new(provider: Arc<dyn SignalProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &'static str {
        "get_weather_forecast"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: CityInput = parse_input(input)?;
        let city = require_non_blank("city", &input.city)?;
        let signal =
            self.provider.evaluate(&SignalQuery::new(city, CapacityThresholds::default())).await;
        Ok(serde_json::to_value(signal)?)
    }
}

pub struct EvaluateReadinessTool {
    evaluator: Arc<ReadinessEvaluator>,
}

impl EvaluateReadinessTool {
    pub fn new(evaluator: Arc<ReadinessEvaluator>) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl Tool for EvaluateReadinessTool {
    fn name(&self) -> &'static str {
        "evaluate_deployment_readiness"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: ReadinessInput = parse_input(input)?;
        let mut request = EvaluationRequest::new(input.target);
        request.location = input.location;
        request.subnet_hint = input.subnet_hint;
        if input.min_required_ips.is_some() {
            request.thresholds = Some(thresholds_with_minimum(
                self.evaluator.default_thresholds(),
                input.min_required_ips,
            ));
        }

        let recommendation =
            self.evaluator.evaluate(&request, "tool", &CancellationToken::new()).await?;
        Ok(serde_json::to_value(recommendation)?)
    }
}

fn thresholds_with_minimum(
    defaults: CapacityThresholds,
    minimum: Option<i64>,
) -> CapacityThresholds {
    match minimum {
        Some(min_required_units) => CapacityThresholds { min_required_units, ..defaults },
        None => defaults,
    }
}
