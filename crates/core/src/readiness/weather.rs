use serde::{Deserialize, Serialize};

use crate::domain::signal::{SignalKind, SignalResult, SignalState};
use crate::errors::DomainError;

pub const DEFAULT_MAX_WIND_SPEED_KMPH: f64 = 50.0;
pub const DEFAULT_MIN_TEMPERATURE_C: f64 = -20.0;
pub const DEFAULT_MAX_TEMPERATURE_C: f64 = 45.0;

pub const DEFAULT_SEVERE_CONDITIONS: &[&str] = &[
    "thunder",
    "storm",
    "blizzard",
    "hurricane",
    "tornado",
    "typhoon",
    "heavy snow",
    "freezing rain",
];

/// Limits past which current weather counts as a deployment concern.
/// Weather is never blocking on its own, so a breach maps to `Degraded`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherThresholds {
    pub max_wind_speed_kmph: f64,
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub severe_conditions: Vec<String>,
}

impl Default for WeatherThresholds {
    fn default() -> Self {
        Self {
            max_wind_speed_kmph: DEFAULT_MAX_WIND_SPEED_KMPH,
            min_temperature_c: DEFAULT_MIN_TEMPERATURE_C,
            max_temperature_c: DEFAULT_MAX_TEMPERATURE_C,
            severe_conditions: DEFAULT_SEVERE_CONDITIONS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl WeatherThresholds {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.max_wind_speed_kmph.is_finite() || self.max_wind_speed_kmph <= 0.0 {
            return Err(DomainError::InvalidThresholds(
                "max_wind_speed_kmph must be a positive number".to_string(),
            ));
        }
        if !self.min_temperature_c.is_finite()
            || !self.max_temperature_c.is_finite()
            || self.min_temperature_c >= self.max_temperature_c
        {
            return Err(DomainError::InvalidThresholds(
                "min_temperature_c must be lower than max_temperature_c".to_string(),
            ));
        }
        Ok(())
    }
}

/// Current conditions reported for a location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub wind_speed_kmph: f64,
    pub description: Option<String>,
    pub temperature_f: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub visibility_km: Option<f64>,
    pub uv_index: Option<f64>,
}

impl WeatherObservation {
    fn metrics(&self) -> Vec<(&'static str, f64)> {
        let mut metrics =
            vec![("temperature_c", self.temperature_c), ("wind_speed_kmph", self.wind_speed_kmph)];
        let optional = [
            ("temperature_f", self.temperature_f),
            ("humidity_percent", self.humidity_percent),
            ("visibility_km", self.visibility_km),
            ("uv_index", self.uv_index),
        ];
        metrics.extend(optional.into_iter().filter_map(|(name, value)| value.map(|v| (name, v))));
        metrics
    }

    fn summary(&self) -> String {
        let description = self.description.as_deref().unwrap_or("conditions unreported");
        format!(
            "{description}, {:.0}°C, wind {:.0} km/h",
            self.temperature_c, self.wind_speed_kmph
        )
    }
}

/// Returns the list of breached limits; empty means calm conditions.
pub fn weather_concerns(observation: &WeatherObservation, thresholds: &WeatherThresholds) -> Vec<String> {
    let mut concerns = Vec::new();

    if observation.wind_speed_kmph >= thresholds.max_wind_speed_kmph {
        concerns.push(format!(
            "wind {:.0} km/h at or above {:.0} km/h",
            observation.wind_speed_kmph, thresholds.max_wind_speed_kmph
        ));
    }
    if observation.temperature_c <= thresholds.min_temperature_c {
        concerns.push(format!(
            "temperature {:.0}°C at or below {:.0}°C",
            observation.temperature_c, thresholds.min_temperature_c
        ));
    }
    if observation.temperature_c >= thresholds.max_temperature_c {
        concerns.push(format!(
            "temperature {:.0}°C at or above {:.0}°C",
            observation.temperature_c, thresholds.max_temperature_c
        ));
    }
    if let Some(description) = &observation.description {
        let lowered = description.to_ascii_lowercase();
        if let Some(condition) = thresholds
            .severe_conditions
            .iter()
            .find(|condition| lowered.contains(&condition.to_ascii_lowercase()))
        {
            concerns.push(format!("severe condition reported ({condition})"));
        }
    }

    concerns
}

/// Builds the environmental signal. Without thresholds the observation is
/// reported as advisory context only.
pub fn weather_signal(
    location: &str,
    observation: &WeatherObservation,
    thresholds: Option<&WeatherThresholds>,
) -> SignalResult {
    let summary = observation.summary();
    let metrics = observation.metrics();

    let Some(thresholds) = thresholds else {
        return SignalResult::new(
            SignalKind::Environmental,
            location,
            SignalState::Ok,
            format!("current conditions: {summary}"),
        )
        .with_metrics(metrics)
        .into_advisory();
    };

    let concerns = weather_concerns(observation, thresholds);
    let (state, detail) = if concerns.is_empty() {
        (SignalState::Ok, format!("calm conditions: {summary}"))
    } else {
        (SignalState::Degraded, format!("{summary}; {}", concerns.join("; ")))
    };

    SignalResult::new(SignalKind::Environmental, location, state, detail).with_metrics(metrics)
}

#[cfg(test)]
mod tests {
    use super::{weather_concerns, weather_signal, WeatherObservation, WeatherThresholds};
    use crate::domain::signal::SignalState;

    fn calm() -> WeatherObservation {
        WeatherObservation {
            temperature_c: 18.0,
            wind_speed_kmph: 12.0,
            description: Some("Partly cloudy".to_string()),
            temperature_f: Some(64.0),
            humidity_percent: Some(60.0),
            visibility_km: Some(10.0),
            uv_index: None,
        }
    }

    #[test]
    fn calm_weather_is_ok_and_carries_metrics() {
        let signal = weather_signal("Portland", &calm(), Some(&WeatherThresholds::default()));

        assert_eq!(signal.state, SignalState::Ok);
        assert!(!signal.advisory);
        assert_eq!(signal.metric("temperature_c"), Some(18.0));
        assert_eq!(signal.metric("humidity_percent"), Some(60.0));
        assert_eq!(signal.metric("uv_index"), None);
    }

    #[test]
    fn high_wind_is_degraded() {
        let observation = WeatherObservation { wind_speed_kmph: 72.0, ..calm() };
        let signal = weather_signal("Portland", &observation, Some(&WeatherThresholds::default()));

        assert_eq!(signal.state, SignalState::Degraded);
        assert!(signal.detail.contains("wind 72 km/h"));
    }

    #[test]
    fn severe_description_and_heat_are_both_reported() {
        let observation = WeatherObservation {
            temperature_c: 47.0,
            description: Some("Thundery outbreaks possible".to_string()),
            ..calm()
        };
        let concerns = weather_concerns(&observation, &WeatherThresholds::default());

        assert_eq!(concerns.len(), 2);
        assert!(concerns[0].contains("temperature 47°C"));
        assert!(concerns[1].contains("thunder"));
    }

    #[test]
    fn weather_never_reaches_critical() {
        let observation = WeatherObservation {
            temperature_c: -40.0,
            wind_speed_kmph: 180.0,
            description: Some("Blizzard".to_string()),
            ..WeatherObservation::default()
        };
        let signal = weather_signal("Nome", &observation, Some(&WeatherThresholds::default()));
        assert_eq!(signal.state, SignalState::Degraded);
    }

    #[test]
    fn unclassified_weather_is_advisory() {
        let observation = WeatherObservation { wind_speed_kmph: 150.0, ..calm() };
        let signal = weather_signal("Portland", &observation, None);

        assert!(signal.advisory);
        assert!(signal.detail.starts_with("current conditions:"));
    }

    #[test]
    fn inverted_temperature_band_is_rejected() {
        let thresholds = WeatherThresholds {
            min_temperature_c: 30.0,
            max_temperature_c: 10.0,
            ..WeatherThresholds::default()
        };
        assert!(thresholds.validate().is_err());
        assert!(WeatherThresholds::default().validate().is_ok());
    }
}
