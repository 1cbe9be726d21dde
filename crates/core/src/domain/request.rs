use serde::{Deserialize, Serialize};

use crate::domain::signal::SignalKind;
use crate::errors::DomainError;
use crate::readiness::capacity::CapacityThresholds;

/// Caller-facing input of a readiness evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub target: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub subnet_hint: Option<String>,
    #[serde(default)]
    pub thresholds: Option<CapacityThresholds>,
}

impl EvaluationRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), location: None, subnet_hint: None, thresholds: None }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_subnet_hint(mut self, subnet_hint: impl Into<String>) -> Self {
        self.subnet_hint = Some(subnet_hint.into());
        self
    }

    pub fn with_thresholds(mut self, thresholds: CapacityThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Identifier a provider of `kind` is queried with, or `None` when the
    /// request gives that provider nothing to look at.
    pub fn target_for(&self, kind: SignalKind) -> Option<&str> {
        match kind {
            SignalKind::ServiceHealth => Some(self.target.trim()),
            SignalKind::Capacity => {
                non_blank(self.subnet_hint.as_deref()).or_else(|| Some(self.target.trim()))
            }
            SignalKind::Environmental => non_blank(self.location.as_deref()),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.target.trim().is_empty() {
            return Err(DomainError::InvalidRequest("target must not be empty".to_string()));
        }
        if let Some(thresholds) = &self.thresholds {
            thresholds.validate()?;
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
