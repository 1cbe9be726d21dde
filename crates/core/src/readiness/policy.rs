use crate::domain::recommendation::{Recommendation, Verdict};
use crate::domain::signal::{SignalResult, SignalState};

/// Folds provider signals into a recommendation.
///
/// Precedence: any critical signal is NO_GO, otherwise any degraded signal is
/// CAUTION, otherwise GO only when every consulted signal is ok. Unknown
/// signals never force NO_GO but prevent GO. Advisory signals appear in the
/// reasons and are ignored for the verdict.
pub fn decide(signals: Vec<SignalResult>) -> Recommendation {
    let verdict = verdict_for(&signals);
    let reasons = signals.iter().map(reason_for).collect();
    Recommendation::new(verdict, reasons, signals)
}

pub fn verdict_for(signals: &[SignalResult]) -> Verdict {
    let mut consulted = signals.iter().filter(|signal| !signal.advisory).peekable();
    if consulted.peek().is_none() {
        return Verdict::Caution;
    }

    let mut all_ok = true;
    for signal in consulted {
        match signal.state {
            SignalState::Critical => return Verdict::NoGo,
            SignalState::Degraded | SignalState::Unknown => all_ok = false,
            SignalState::Ok => {}
        }
    }

    if all_ok {
        Verdict::Go
    } else {
        Verdict::Caution
    }
}

pub fn reason_for(signal: &SignalResult) -> String {
    let phrase = match signal.state {
        SignalState::Ok => "passed",
        SignalState::Degraded => "raised a concern",
        SignalState::Critical => "is blocking deployment",
        SignalState::Unknown => "is unverified",
    };
    let mut reason =
        format!("{} check for {} {phrase}: {}", signal.kind.label(), signal.target, signal.detail);
    if signal.advisory {
        reason.push_str(" (advisory)");
    }
    reason
}
