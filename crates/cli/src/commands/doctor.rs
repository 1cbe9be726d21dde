use readygate_agent::ReadinessRuntime;
use readygate_core::config::{AppConfig, LoadOptions};
use readygate_core::CapacitySource;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self::new(name, CheckStatus::Skipped, "skipped because configuration did not load")
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::new(
                "config_validation",
                CheckStatus::Pass,
                "configuration loaded and validated",
            ));
            checks.push(check_provider_wiring(&config));
            checks.push(check_capacity_source(&config));
            checks.push(check_weather_classification(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::new("config_validation", CheckStatus::Fail, error.to_string()));
            checks.push(DoctorCheck::skipped("provider_wiring"));
            checks.push(DoctorCheck::skipped("capacity_source"));
            checks.push(DoctorCheck::skipped("weather_classification"));
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_provider_wiring(config: &AppConfig) -> DoctorCheck {
    if let Err(error) = ReadinessRuntime::from_config(config) {
        return DoctorCheck::new("provider_wiring", CheckStatus::Fail, error.to_string());
    }

    let providers = config.enabled_providers();
    if providers.is_empty() {
        return DoctorCheck::new(
            "provider_wiring",
            CheckStatus::Fail,
            "no signal providers enabled; every evaluation would return CAUTION",
        );
    }

    DoctorCheck::new(
        "provider_wiring",
        CheckStatus::Pass,
        format!("enabled providers: {}", providers.join(", ")),
    )
}

fn check_capacity_source(config: &AppConfig) -> DoctorCheck {
    if !config.ipam.enabled {
        return DoctorCheck::new(
            "capacity_source",
            CheckStatus::Skipped,
            "capacity provider disabled",
        );
    }

    let details = match config.ipam.source() {
        CapacitySource::Live => format!("live IPAM inventory at `{}`", config.ipam.base_url),
        CapacitySource::Simulated => {
            "simulated inventory; set READYGATE_IPAM_API_KEY for live subnet data".to_string()
        }
    };
    DoctorCheck::new("capacity_source", CheckStatus::Pass, details)
}

fn check_weather_classification(config: &AppConfig) -> DoctorCheck {
    if !config.weather.enabled {
        return DoctorCheck::new(
            "weather_classification",
            CheckStatus::Skipped,
            "environmental provider disabled",
        );
    }

    let details = if config.weather.classify {
        let thresholds = &config.weather.thresholds;
        format!(
            "classified: wind below {} km/h, temperature within {}..{} C",
            thresholds.max_wind_speed_kmph,
            thresholds.min_temperature_c,
            thresholds.max_temperature_c
        )
    } else {
        "advisory only: weather is reported but does not affect the verdict".to_string()
    };
    DoctorCheck::new("weather_classification", CheckStatus::Pass, details)
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
