use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::signal::{SignalKind, SignalResult, SignalState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "NO_GO")]
    NoGo,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "GO",
            Self::Caution => "CAUTION",
            Self::NoGo => "NO_GO",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::Go => "All consulted signals are healthy; proceed with deployment.",
            Self::Caution => "Concerns or missing data detected; proceed only with extra monitoring.",
            Self::NoGo => "A blocking condition was detected; delay deployment.",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of one evaluation. Built once, never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    verdict: Verdict,
    reasons: Vec<String>,
    signals: Vec<SignalResult>,
}

impl Recommendation {
    pub(crate) fn new(verdict: Verdict, reasons: Vec<String>, signals: Vec<SignalResult>) -> Self {
        Self { verdict, reasons, signals }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn signals(&self) -> &[SignalResult] {
        &self.signals
    }

    pub fn signal(&self, kind: SignalKind) -> Option<&SignalResult> {
        self.signals.iter().find(|signal| signal.kind == kind)
    }

    pub fn count_in_state(&self, state: SignalState) -> usize {
        self.signals.iter().filter(|signal| signal.state == state).count()
    }

    pub fn unverified(&self) -> impl Iterator<Item = &SignalResult> {
        self.signals.iter().filter(|signal| signal.state == SignalState::Unknown)
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![format!("Recommendation: {} - {}", self.verdict, self.verdict.headline())];
        lines.extend(self.reasons.iter().map(|reason| format!("- {reason}")));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::Verdict;

    #[test]
    fn verdict_serializes_with_wire_names() {
        assert_eq!(serde_json::to_value(Verdict::Go).expect("serialize"), "GO");
        assert_eq!(serde_json::to_value(Verdict::Caution).expect("serialize"), "CAUTION");
        assert_eq!(serde_json::to_value(Verdict::NoGo).expect("serialize"), "NO_GO");

        let parsed: Verdict = serde_json::from_str("\"NO_GO\"").expect("parse");
        assert_eq!(parsed, Verdict::NoGo);
    }
}
