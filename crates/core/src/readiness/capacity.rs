use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::signal::{SignalKind, SignalResult, SignalState};
use crate::errors::DomainError;

pub const DEFAULT_MIN_REQUIRED_UNITS: i64 = 10;
pub const DEFAULT_WARNING_UTILIZATION_PERCENT: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityThresholds {
    #[serde(default = "default_min_required_units")]
    pub min_required_units: i64,
    #[serde(default = "default_warning_utilization_percent")]
    pub warning_utilization_percent: f64,
}

fn default_min_required_units() -> i64 {
    DEFAULT_MIN_REQUIRED_UNITS
}

fn default_warning_utilization_percent() -> f64 {
    DEFAULT_WARNING_UTILIZATION_PERCENT
}

impl Default for CapacityThresholds {
    fn default() -> Self {
        Self {
            min_required_units: DEFAULT_MIN_REQUIRED_UNITS,
            warning_utilization_percent: DEFAULT_WARNING_UTILIZATION_PERCENT,
        }
    }
}

impl CapacityThresholds {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_required_units < 0 {
            return Err(DomainError::InvalidThresholds(format!(
                "min_required_units must not be negative (got {})",
                self.min_required_units
            )));
        }
        let percent = self.warning_utilization_percent;
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(DomainError::InvalidThresholds(format!(
                "warning_utilization_percent must be within 0..=100 (got {percent})"
            )));
        }
        Ok(())
    }
}

/// Address counts for one target, possibly summed over several segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityCounts {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

impl CapacityCounts {
    pub fn new(total: u64, used: u64, available: u64) -> Self {
        Self { total, used, available }
    }

    pub fn combine(self, other: Self) -> Self {
        Self {
            total: self.total.saturating_add(other.total),
            used: self.used.saturating_add(other.used),
            available: self.available.saturating_add(other.available),
        }
    }

    /// `used / total * 100`, or `0` for an empty segment.
    pub fn utilization_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }
}

impl FromIterator<CapacityCounts> for CapacityCounts {
    fn from_iter<I: IntoIterator<Item = CapacityCounts>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::combine)
    }
}

/// Absolute headroom is checked before utilization: a segment without enough
/// free units is critical whatever its utilization.
pub fn classify_capacity(counts: &CapacityCounts, thresholds: &CapacityThresholds) -> SignalState {
    let available = i64::try_from(counts.available).unwrap_or(i64::MAX);
    if available < thresholds.min_required_units {
        return SignalState::Critical;
    }
    if counts.utilization_percent() >= thresholds.warning_utilization_percent {
        return SignalState::Degraded;
    }
    SignalState::Ok
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacitySource {
    Live,
    Simulated,
}

impl CapacitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Simulated => "simulated",
        }
    }
}

pub fn capacity_signal(
    target: &str,
    counts: &CapacityCounts,
    thresholds: &CapacityThresholds,
    source: CapacitySource,
) -> SignalResult {
    let utilization = counts.utilization_percent();
    let state = classify_capacity(counts, thresholds);
    let mut detail = format!("{} IPs available ({utilization:.1}% utilized)", counts.available);
    match state {
        SignalState::Critical => detail.push_str(&format!(
            "; below the {} required for deployment",
            thresholds.min_required_units
        )),
        SignalState::Degraded => detail.push_str(&format!(
            "; at or above the {:.1}% utilization warning",
            thresholds.warning_utilization_percent
        )),
        SignalState::Ok | SignalState::Unknown => {}
    }
    if source == CapacitySource::Simulated {
        detail.push_str(" (simulated inventory)");
    }

    SignalResult::new(SignalKind::Capacity, target, state, detail).with_metrics([
        ("total_ips", counts.total as f64),
        ("used_ips", counts.used as f64),
        ("available_ips", counts.available as f64),
        ("utilization_percent", round_one_decimal(utilization)),
        ("min_required", thresholds.min_required_units as f64),
    ])
}

pub fn capacity_not_found(target: &str, source: CapacitySource) -> SignalResult {
    let mut detail = format!("target not found in inventory: no subnet matches `{target}`");
    if source == CapacitySource::Simulated {
        detail.push_str(" (simulated inventory)");
    }
    SignalResult::unknown(SignalKind::Capacity, target, detail)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Built-in inventory used when no IPAM credentials are configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticInventory {
    entries: BTreeMap<String, CapacityCounts>,
}

impl Default for StaticInventory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StaticInventory {
    pub fn builtin() -> Self {
        Self::from_entries([
            ("us-west-2", CapacityCounts::new(256, 45, 211)),
            ("us-east-1", CapacityCounts::new(512, 489, 23)),
            ("eu-west-1", CapacityCounts::new(128, 120, 8)),
            ("ap-southeast-1", CapacityCounts::new(256, 100, 156)),
        ])
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, CapacityCounts)>,
        K: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, counts)| (normalize_key(key.as_ref()), counts))
                .collect(),
        }
    }

    pub fn lookup(&self, target: &str) -> Option<CapacityCounts> {
        self.entries.get(&normalize_key(target)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{
        capacity_not_found, capacity_signal, classify_capacity, CapacityCounts, CapacitySource,
        CapacityThresholds, StaticInventory,
    };
    use crate::domain::signal::SignalState;
    use crate::errors::DomainError;

    #[test]
    fn roomy_segment_is_ok() {
        let signal = capacity_signal(
            "us-west-2",
            &CapacityCounts::new(256, 45, 211),
            &CapacityThresholds::default(),
            CapacitySource::Live,
        );

        assert_eq!(signal.state, SignalState::Ok);
        assert_eq!(signal.metric("utilization_percent"), Some(17.6));
        assert_eq!(signal.metric("available_ips"), Some(211.0));
        assert_eq!(signal.detail, "211 IPs available (17.6% utilized)");
    }

    #[test]
    fn busy_segment_with_headroom_is_degraded() {
        let signal = capacity_signal(
            "us-east-1",
            &CapacityCounts::new(512, 489, 23),
            &CapacityThresholds::default(),
            CapacitySource::Live,
        );

        assert_eq!(signal.state, SignalState::Degraded);
        assert_eq!(signal.metric("utilization_percent"), Some(95.5));
    }

    #[test]
    fn insufficient_headroom_is_critical_regardless_of_utilization() {
        let thresholds = CapacityThresholds::default();
        assert_eq!(
            classify_capacity(&CapacityCounts::new(128, 120, 8), &thresholds),
            SignalState::Critical
        );
        // Low utilization does not rescue a segment that is simply too small.
        assert_eq!(
            classify_capacity(&CapacityCounts::new(16, 8, 8), &thresholds),
            SignalState::Critical
        );
    }

    #[test]
    fn empty_segment_has_zero_utilization() {
        let counts = CapacityCounts::new(0, 0, 0);
        assert_eq!(counts.utilization_percent(), 0.0);
        assert_eq!(
            classify_capacity(
                &counts,
                &CapacityThresholds { min_required_units: 0, ..CapacityThresholds::default() }
            ),
            SignalState::Ok
        );
    }

    #[test]
    fn shrinking_availability_never_improves_state() {
        let thresholds = CapacityThresholds::default();
        let total = 200_u64;
        let mut previous = SignalState::Ok;
        for available in (0..=total).rev() {
            let counts = CapacityCounts::new(total, total - available, available);
            let state = classify_capacity(&counts, &thresholds);
            assert!(
                state >= previous,
                "available={available} moved from {previous} to {state}"
            );
            previous = state;
        }
        assert_eq!(previous, SignalState::Critical);
    }

    #[test]
    fn counts_sum_across_segments() {
        let counts: CapacityCounts =
            [CapacityCounts::new(256, 200, 56), CapacityCounts::new(256, 56, 200)]
                .into_iter()
                .collect();
        assert_eq!(counts, CapacityCounts::new(512, 256, 256));
        assert_eq!(counts.utilization_percent(), 50.0);
    }

    #[test]
    fn simulated_results_are_labelled() {
        let signal = capacity_signal(
            "us-west-2",
            &CapacityCounts::new(256, 45, 211),
            &CapacityThresholds::default(),
            CapacitySource::Simulated,
        );
        assert!(signal.detail.ends_with("(simulated inventory)"));

        let missing = capacity_not_found("mars-north-1", CapacitySource::Simulated);
        assert_eq!(missing.state, SignalState::Unknown);
        assert!(missing.detail.contains("target not found in inventory"));
    }

    #[test]
    fn builtin_inventory_lookup_is_case_insensitive() {
        let inventory = StaticInventory::builtin();
        assert_eq!(inventory.len(), 4);
        assert_eq!(inventory.lookup(" US-EAST-1 "), Some(CapacityCounts::new(512, 489, 23)));
        assert_eq!(inventory.lookup("mars-north-1"), None);
    }

    #[test]
    fn thresholds_reject_negative_minimum_and_out_of_range_percent() {
        let negative = CapacityThresholds { min_required_units: -5, ..CapacityThresholds::default() };
        assert!(matches!(negative.validate(), Err(DomainError::InvalidThresholds(_))));

        let too_high =
            CapacityThresholds { warning_utilization_percent: 120.0, ..CapacityThresholds::default() };
        assert!(too_high.validate().is_err());

        let not_a_number = CapacityThresholds {
            warning_utilization_percent: f64::NAN,
            ..CapacityThresholds::default()
        };
        assert!(not_a_number.validate().is_err());

        assert!(CapacityThresholds::default().validate().is_ok());
    }

    #[test]
    fn thresholds_default_missing_fields_when_parsed() {
        let parsed: CapacityThresholds =
            serde_json::from_str(r#"{"min_required_units": 25}"#).expect("thresholds should parse");
        assert_eq!(parsed.min_required_units, 25);
        assert_eq!(parsed.warning_utilization_percent, 80.0);
    }
}
