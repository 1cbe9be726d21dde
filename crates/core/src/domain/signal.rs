use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    ServiceHealth,
    Environmental,
    Capacity,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceHealth => "service_health",
            Self::Environmental => "environmental",
            Self::Capacity => "capacity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ServiceHealth => "Service health",
            Self::Environmental => "Environmental",
            Self::Capacity => "Capacity",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Ok < Degraded < Critical`; `Unknown` sorts last and carries no severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalState {
    Ok,
    Degraded,
    Critical,
    Unknown,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider's assessment of a single risk dimension for a target.
///
/// `state == Unknown` means the provider could not obtain data. It never means
/// "no issue".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub kind: SignalKind,
    pub target: String,
    pub state: SignalState,
    pub detail: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
    /// Advisory signals are reported but do not take part in the verdict.
    #[serde(default)]
    pub advisory: bool,
}

impl SignalResult {
    pub fn new(
        kind: SignalKind,
        target: impl Into<String>,
        state: SignalState,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            state,
            detail: detail.into(),
            metrics: BTreeMap::new(),
            advisory: false,
        }
    }

    pub fn unknown(kind: SignalKind, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(kind, target, SignalState::Unknown, detail)
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_metrics<I, K>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.metrics.extend(metrics.into_iter().map(|(name, value)| (name.into(), value)));
        self
    }

    pub fn into_advisory(mut self) -> Self {
        self.advisory = true;
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{SignalKind, SignalResult, SignalState};

    #[test]
    fn signal_serializes_with_snake_case_enums() {
        let signal =
            SignalResult::new(SignalKind::ServiceHealth, "us-east-1", SignalState::Ok, "clear")
                .with_metric("mentions", 0.0);

        let value = serde_json::to_value(&signal).expect("signal should serialize");
        assert_eq!(value["kind"], "service_health");
        assert_eq!(value["state"], "ok");
        assert_eq!(value["metrics"]["mentions"], 0.0);
        assert_eq!(value["advisory"], false);
    }

    #[test]
    fn empty_metrics_are_omitted_and_default_on_read() {
        let signal = SignalResult::unknown(SignalKind::Capacity, "prod-vpc-1", "feed unavailable");
        let encoded = serde_json::to_string(&signal).expect("signal should serialize");
        assert!(!encoded.contains("metrics"));

        let decoded: SignalResult = serde_json::from_str(&encoded).expect("signal should parse");
        assert_eq!(decoded, signal);
    }

    #[test]
    fn unknown_is_not_a_known_state() {
        assert!(!SignalState::Unknown.is_known());
        assert!(SignalState::Critical.is_known());
        assert!(SignalState::Ok < SignalState::Degraded);
        assert!(SignalState::Degraded < SignalState::Critical);
    }
}
