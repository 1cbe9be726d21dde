use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use readygate_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

/// One printable configuration field and where its value can come from.
struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl Field {
    fn new(
        key_path: &'static str,
        env_keys: &'static [&'static str],
        value: impl ToString,
    ) -> Self {
        Self { key_path, env_keys, value: value.to_string() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let thresholds = &config.weather.thresholds;
    vec![
        Field::new("http.timeout_secs", &["READYGATE_HTTP_TIMEOUT_SECS"], config.http.timeout_secs),
        Field::new("http.user_agent", &["READYGATE_HTTP_USER_AGENT"], &config.http.user_agent),
        Field::new(
            "service_health.enabled",
            &["READYGATE_SERVICE_HEALTH_ENABLED"],
            config.service_health.enabled,
        ),
        Field::new(
            "service_health.feed_url",
            &["READYGATE_SERVICE_HEALTH_FEED_URL"],
            &config.service_health.feed_url,
        ),
        Field::new(
            "service_health.recency_hours",
            &["READYGATE_SERVICE_HEALTH_RECENCY_HOURS"],
            config
                .service_health
                .recency_hours
                .map(|hours| hours.to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
        ),
        Field::new("weather.enabled", &["READYGATE_WEATHER_ENABLED"], config.weather.enabled),
        Field::new("weather.base_url", &["READYGATE_WEATHER_BASE_URL"], &config.weather.base_url),
        Field::new("weather.classify", &["READYGATE_WEATHER_CLASSIFY"], config.weather.classify),
        Field::new(
            "weather.max_wind_speed_kmph",
            &["READYGATE_WEATHER_MAX_WIND_SPEED_KMPH"],
            thresholds.max_wind_speed_kmph,
        ),
        Field::new(
            "weather.min_temperature_c",
            &["READYGATE_WEATHER_MIN_TEMPERATURE_C"],
            thresholds.min_temperature_c,
        ),
        Field::new(
            "weather.max_temperature_c",
            &["READYGATE_WEATHER_MAX_TEMPERATURE_C"],
            thresholds.max_temperature_c,
        ),
        Field::new("weather.severe_conditions", &[], thresholds.severe_conditions.join(", ")),
        Field::new("ipam.enabled", &["READYGATE_IPAM_ENABLED"], config.ipam.enabled),
        Field::new(
            "ipam.base_url",
            &["READYGATE_IPAM_BASE_URL", "IPAM_BASE_URL"],
            &config.ipam.base_url,
        ),
        Field::new(
            "ipam.api_key",
            &["READYGATE_IPAM_API_KEY", "IPAM_API_KEY"],
            redact_secret(config.ipam.api_key.as_ref()),
        ),
        Field::new("ipam.source", &[], config.ipam.source().as_str()),
        Field::new(
            "evaluation.deadline_secs",
            &["READYGATE_EVALUATION_DEADLINE_SECS"],
            config.evaluation.deadline_secs,
        ),
        Field::new(
            "evaluation.min_required_units",
            &["READYGATE_EVALUATION_MIN_REQUIRED_UNITS"],
            config.evaluation.thresholds.min_required_units,
        ),
        Field::new(
            "evaluation.warning_utilization_percent",
            &["READYGATE_EVALUATION_WARNING_UTILIZATION_PERCENT"],
            config.evaluation.thresholds.warning_utilization_percent,
        ),
        Field::new(
            "server.bind_address",
            &["READYGATE_SERVER_BIND_ADDRESS"],
            &config.server.bind_address,
        ),
        Field::new("server.port", &["READYGATE_SERVER_PORT"], config.server.port),
        Field::new(
            "server.graceful_shutdown_secs",
            &["READYGATE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs,
        ),
        Field::new(
            "server.bearer_token",
            &["READYGATE_SERVER_BEARER_TOKEN"],
            redact_secret(config.server.bearer_token.as_ref()),
        ),
        Field::new(
            "logging.level",
            &["READYGATE_LOGGING_LEVEL", "READYGATE_LOG_LEVEL"],
            &config.logging.level,
        ),
        Field::new(
            "logging.format",
            &["READYGATE_LOGGING_FORMAT", "READYGATE_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("readygate.toml"), PathBuf::from("config/readygate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env_key = env_keys
        .iter()
        .find(|env_key| env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = set_env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> &'static str {
    match secret {
        Some(secret) if secret.expose_secret().trim().is_empty() => "<empty>",
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}
