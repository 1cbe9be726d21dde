use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::readiness::capacity::{CapacitySource, CapacityThresholds};
use crate::readiness::weather::WeatherThresholds;

pub const DEFAULT_STATUS_FEED_URL: &str = "https://status.aws.amazon.com/rss/all.rss";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://wttr.in";
pub const DEFAULT_IPAM_BASE_URL: &str = "https://csp.infoblox.com/api/ddi/v1";
pub const DEFAULT_USER_AGENT: &str = "DevOpsAgent/1.0";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub service_health: ServiceHealthConfig,
    pub weather: WeatherConfig,
    pub ipam: IpamConfig,
    pub evaluation: EvaluationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Clone, Debug)]
pub struct ServiceHealthConfig {
    pub enabled: bool,
    pub feed_url: String,
    pub recency_hours: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub base_url: String,
    pub classify: bool,
    pub thresholds: WeatherThresholds,
}

#[derive(Clone, Debug)]
pub struct IpamConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

impl IpamConfig {
    pub fn source(&self) -> CapacitySource {
        let has_key = self
            .api_key
            .as_ref()
            .map(|key| !key.expose_secret().trim().is_empty())
            .unwrap_or(false);
        if has_key {
            CapacitySource::Live
        } else {
            CapacitySource::Simulated
        }
    }
}

#[derive(Clone, Debug)]
pub struct EvaluationConfig {
    pub deadline_secs: u64,
    pub thresholds: CapacityThresholds,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub bearer_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub service_health_enabled: Option<bool>,
    pub weather_enabled: Option<bool>,
    pub ipam_enabled: Option<bool>,
    pub ipam_api_key: Option<String>,
    pub min_required_units: Option<i64>,
    pub warning_utilization_percent: Option<f64>,
    pub deadline_secs: Option<u64>,
    pub server_port: Option<u16>,
    pub bearer_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig { timeout_secs: 10, user_agent: DEFAULT_USER_AGENT.to_string() },
            service_health: ServiceHealthConfig {
                enabled: true,
                feed_url: DEFAULT_STATUS_FEED_URL.to_string(),
                recency_hours: None,
            },
            weather: WeatherConfig {
                enabled: true,
                base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
                classify: true,
                thresholds: WeatherThresholds::default(),
            },
            ipam: IpamConfig {
                enabled: true,
                base_url: DEFAULT_IPAM_BASE_URL.to_string(),
                api_key: None,
            },
            evaluation: EvaluationConfig {
                deadline_secs: 15,
                thresholds: CapacityThresholds::default(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                bearer_token: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("readygate.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(http) = patch.http {
            if let Some(timeout_secs) = http.timeout_secs {
                self.http.timeout_secs = timeout_secs;
            }
            if let Some(user_agent) = http.user_agent {
                self.http.user_agent = user_agent;
            }
        }

        if let Some(service_health) = patch.service_health {
            if let Some(enabled) = service_health.enabled {
                self.service_health.enabled = enabled;
            }
            if let Some(feed_url) = service_health.feed_url {
                self.service_health.feed_url = feed_url;
            }
            if let Some(recency_hours) = service_health.recency_hours {
                self.service_health.recency_hours = Some(recency_hours);
            }
        }

        if let Some(weather) = patch.weather {
            if let Some(enabled) = weather.enabled {
                self.weather.enabled = enabled;
            }
            if let Some(base_url) = weather.base_url {
                self.weather.base_url = base_url;
            }
            if let Some(classify) = weather.classify {
                self.weather.classify = classify;
            }
            if let Some(max_wind_speed_kmph) = weather.max_wind_speed_kmph {
                self.weather.thresholds.max_wind_speed_kmph = max_wind_speed_kmph;
            }
            if let Some(min_temperature_c) = weather.min_temperature_c {
                self.weather.thresholds.min_temperature_c = min_temperature_c;
            }
            if let Some(max_temperature_c) = weather.max_temperature_c {
                self.weather.thresholds.max_temperature_c = max_temperature_c;
            }
            if let Some(severe_conditions) = weather.severe_conditions {
                self.weather.thresholds.severe_conditions = severe_conditions;
            }
        }

        if let Some(ipam) = patch.ipam {
            if let Some(enabled) = ipam.enabled {
                self.ipam.enabled = enabled;
            }
            if let Some(base_url) = ipam.base_url {
                self.ipam.base_url = base_url;
            }
            if let Some(ipam_api_key_value) = ipam.api_key {
                self.ipam.api_key = Some(secret_value(ipam_api_key_value));
            }
        }

        if let Some(evaluation) = patch.evaluation {
            if let Some(deadline_secs) = evaluation.deadline_secs {
                self.evaluation.deadline_secs = deadline_secs;
            }
            if let Some(min_required_units) = evaluation.min_required_units {
                self.evaluation.thresholds.min_required_units = min_required_units;
            }
            if let Some(warning_utilization_percent) = evaluation.warning_utilization_percent {
                self.evaluation.thresholds.warning_utilization_percent =
                    warning_utilization_percent;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(bearer_token_value) = server.bearer_token {
                self.server.bearer_token = Some(secret_value(bearer_token_value));
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("READYGATE_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_u64("READYGATE_HTTP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("READYGATE_HTTP_USER_AGENT") {
            self.http.user_agent = value;
        }

        if let Some(value) = read_env("READYGATE_SERVICE_HEALTH_ENABLED") {
            self.service_health.enabled = parse_bool("READYGATE_SERVICE_HEALTH_ENABLED", &value)?;
        }
        if let Some(value) = read_env("READYGATE_SERVICE_HEALTH_FEED_URL") {
            self.service_health.feed_url = value;
        }
        if let Some(value) = read_env("READYGATE_SERVICE_HEALTH_RECENCY_HOURS") {
            self.service_health.recency_hours =
                Some(parse_u32("READYGATE_SERVICE_HEALTH_RECENCY_HOURS", &value)?);
        }

        if let Some(value) = read_env("READYGATE_WEATHER_ENABLED") {
            self.weather.enabled = parse_bool("READYGATE_WEATHER_ENABLED", &value)?;
        }
        if let Some(value) = read_env("READYGATE_WEATHER_BASE_URL") {
            self.weather.base_url = value;
        }
        if let Some(value) = read_env("READYGATE_WEATHER_CLASSIFY") {
            self.weather.classify = parse_bool("READYGATE_WEATHER_CLASSIFY", &value)?;
        }
        if let Some(value) = read_env("READYGATE_WEATHER_MAX_WIND_SPEED_KMPH") {
            self.weather.thresholds.max_wind_speed_kmph =
                parse_f64("READYGATE_WEATHER_MAX_WIND_SPEED_KMPH", &value)?;
        }
        if let Some(value) = read_env("READYGATE_WEATHER_MIN_TEMPERATURE_C") {
            self.weather.thresholds.min_temperature_c =
                parse_f64("READYGATE_WEATHER_MIN_TEMPERATURE_C", &value)?;
        }
        if let Some(value) = read_env("READYGATE_WEATHER_MAX_TEMPERATURE_C") {
            self.weather.thresholds.max_temperature_c =
                parse_f64("READYGATE_WEATHER_MAX_TEMPERATURE_C", &value)?;
        }

        if let Some(value) = read_env("READYGATE_IPAM_ENABLED") {
            self.ipam.enabled = parse_bool("READYGATE_IPAM_ENABLED", &value)?;
        }
        let ipam_base_url = read_env("READYGATE_IPAM_BASE_URL").or_else(|| read_env("IPAM_BASE_URL"));
        if let Some(value) = ipam_base_url {
            self.ipam.base_url = value;
        }
        let ipam_api_key = read_env("READYGATE_IPAM_API_KEY").or_else(|| read_env("IPAM_API_KEY"));
        if let Some(value) = ipam_api_key {
            self.ipam.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("READYGATE_EVALUATION_DEADLINE_SECS") {
            self.evaluation.deadline_secs = parse_u64("READYGATE_EVALUATION_DEADLINE_SECS", &value)?;
        }
        if let Some(value) = read_env("READYGATE_EVALUATION_MIN_REQUIRED_UNITS") {
            self.evaluation.thresholds.min_required_units =
                parse_i64("READYGATE_EVALUATION_MIN_REQUIRED_UNITS", &value)?;
        }
        if let Some(value) = read_env("READYGATE_EVALUATION_WARNING_UTILIZATION_PERCENT") {
            self.evaluation.thresholds.warning_utilization_percent =
                parse_f64("READYGATE_EVALUATION_WARNING_UTILIZATION_PERCENT", &value)?;
        }

        if let Some(value) = read_env("READYGATE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("READYGATE_SERVER_PORT") {
            self.server.port = parse_u16("READYGATE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("READYGATE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("READYGATE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("READYGATE_SERVER_BEARER_TOKEN") {
            self.server.bearer_token = Some(secret_value(value));
        }

        let log_level =
            read_env("READYGATE_LOGGING_LEVEL").or_else(|| read_env("READYGATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("READYGATE_LOGGING_FORMAT").or_else(|| read_env("READYGATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.service_health_enabled {
            self.service_health.enabled = enabled;
        }
        if let Some(enabled) = overrides.weather_enabled {
            self.weather.enabled = enabled;
        }
        if let Some(enabled) = overrides.ipam_enabled {
            self.ipam.enabled = enabled;
        }
        if let Some(ipam_api_key) = overrides.ipam_api_key {
            self.ipam.api_key = Some(secret_value(ipam_api_key));
        }
        if let Some(min_required_units) = overrides.min_required_units {
            self.evaluation.thresholds.min_required_units = min_required_units;
        }
        if let Some(warning_utilization_percent) = overrides.warning_utilization_percent {
            self.evaluation.thresholds.warning_utilization_percent = warning_utilization_percent;
        }
        if let Some(deadline_secs) = overrides.deadline_secs {
            self.evaluation.deadline_secs = deadline_secs;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(bearer_token) = overrides.bearer_token {
            self.server.bearer_token = Some(secret_value(bearer_token));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http(&self.http)?;
        validate_service_health(&self.service_health)?;
        validate_weather(&self.weather)?;
        validate_ipam(&self.ipam)?;
        validate_evaluation(&self.evaluation)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.service_health.enabled {
            providers.push("service_health");
        }
        if self.ipam.enabled {
            providers.push("capacity");
        }
        if self.weather.enabled {
            providers.push("environmental");
        }
        providers
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("readygate.toml"), PathBuf::from("config/readygate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.timeout_secs == 0 || http.timeout_secs > 300 {
        return Err(ConfigError::Validation("http.timeout_secs must be in range 1..=300".to_string()));
    }
    if http.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation("http.user_agent must not be empty".to_string()));
    }
    Ok(())
}

fn validate_service_health(service_health: &ServiceHealthConfig) -> Result<(), ConfigError> {
    validate_url("service_health.feed_url", &service_health.feed_url)?;
    if service_health.recency_hours == Some(0) {
        return Err(ConfigError::Validation(
            "service_health.recency_hours must be greater than zero when set".to_string(),
        ));
    }
    Ok(())
}

fn validate_weather(weather: &WeatherConfig) -> Result<(), ConfigError> {
    validate_url("weather.base_url", &weather.base_url)?;
    weather
        .thresholds
        .validate()
        .map_err(|error| ConfigError::Validation(format!("weather: {error}")))
}

fn validate_ipam(ipam: &IpamConfig) -> Result<(), ConfigError> {
    validate_url("ipam.base_url", &ipam.base_url)
}

fn validate_evaluation(evaluation: &EvaluationConfig) -> Result<(), ConfigError> {
    if evaluation.deadline_secs == 0 || evaluation.deadline_secs > 300 {
        return Err(ConfigError::Validation(
            "evaluation.deadline_secs must be in range 1..=300".to_string(),
        ));
    }
    evaluation
        .thresholds
        .validate()
        .map_err(|error| ConfigError::Validation(format!("evaluation: {error}")))
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    let blank_token = server
        .bearer_token
        .as_ref()
        .map(|token| token.expose_secret().trim().is_empty())
        .unwrap_or(false);
    if blank_token {
        return Err(ConfigError::Validation(
            "server.bearer_token must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    http: Option<HttpPatch>,
    service_health: Option<ServiceHealthPatch>,
    weather: Option<WeatherPatch>,
    ipam: Option<IpamPatch>,
    evaluation: Option<EvaluationPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceHealthPatch {
    enabled: Option<bool>,
    feed_url: Option<String>,
    recency_hours: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    classify: Option<bool>,
    max_wind_speed_kmph: Option<f64>,
    min_temperature_c: Option<f64>,
    max_temperature_c: Option<f64>,
    severe_conditions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct IpamPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EvaluationPatch {
    deadline_secs: Option<u64>,
    min_required_units: Option<i64>,
    warning_utilization_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    bearer_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::readiness::capacity::CapacitySource;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_and_use_simulated_capacity() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.ipam.source() == CapacitySource::Simulated, "no api key means simulated")?;
        ensure(config.evaluation.thresholds.min_required_units == 10, "default minimum is 10")?;
        ensure(
            config.evaluation.thresholds.warning_utilization_percent == 80.0,
            "default warning utilization is 80%",
        )?;
        ensure(
            config.enabled_providers() == ["service_health", "capacity", "environmental"],
            "all providers are enabled by default",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_IPAM_TOKEN", "ipam-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("readygate.toml");
            fs::write(
                &path,
                r#"
[ipam]
api_key = "${TEST_IPAM_TOKEN}"
base_url = "https://ipam.internal.example/api/ddi/v1"

[weather]
classify = false
max_wind_speed_kmph = 65.0
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.ipam.api_key.as_ref().map(|key| key.expose_secret() == "ipam-from-env")
                    == Some(true),
                "ipam api key should be loaded from environment",
            )?;
            ensure(config.ipam.source() == CapacitySource::Live, "api key enables live inventory")?;
            ensure(!config.weather.classify, "weather classification should be disabled by file")?;
            ensure(
                config.weather.thresholds.max_wind_speed_kmph == 65.0,
                "wind threshold should come from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_IPAM_TOKEN"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("READYGATE_LOG_LEVEL", "warn");
        env::set_var("READYGATE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["READYGATE_LOG_LEVEL", "READYGATE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn lab_ipam_variables_are_accepted_as_fallbacks() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("IPAM_API_KEY", "lab-key");
        env::set_var("IPAM_BASE_URL", "https://lab.example/api/ddi/v1");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.ipam.base_url == "https://lab.example/api/ddi/v1", "base url fallback")?;
            ensure(config.ipam.source() == CapacitySource::Live, "api key fallback")?;
            Ok(())
        })();

        clear_vars(&["IPAM_API_KEY", "IPAM_BASE_URL"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("READYGATE_EVALUATION_MIN_REQUIRED_UNITS", "20");
        env::set_var("READYGATE_SERVER_PORT", "9090");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("readygate.toml");
            fs::write(
                &path,
                r#"
[evaluation]
min_required_units = 15
warning_utilization_percent = 70.0

[server]
port = 7070

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    server_port: Some(6060),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 6060, "override port should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.evaluation.thresholds.min_required_units == 20,
                "env minimum should win over file and defaults",
            )?;
            ensure(
                config.evaluation.thresholds.warning_utilization_percent == 70.0,
                "file utilization should win over defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["READYGATE_EVALUATION_MIN_REQUIRED_UNITS", "READYGATE_SERVER_PORT"]);
        result
    }

    #[test]
    fn negative_minimum_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("READYGATE_EVALUATION_MIN_REQUIRED_UNITS", "-3");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("min_required_units")
            );
            ensure(has_message, "validation failure should mention min_required_units")
        })();

        clear_vars(&["READYGATE_EVALUATION_MIN_REQUIRED_UNITS"]);
        result
    }

    #[test]
    fn non_http_feed_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("READYGATE_SERVICE_HEALTH_FEED_URL", "ftp://status.example/rss");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default())
                .err()
                .ok_or_else(|| "expected validation failure".to_string())?;
            ensure(
                error.to_string().contains("service_health.feed_url"),
                "validation failure should name the feed url",
            )
        })();

        clear_vars(&["READYGATE_SERVICE_HEALTH_FEED_URL"]);
        result
    }

    #[test]
    fn unparsable_env_value_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("READYGATE_WEATHER_ENABLED", "maybe");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default())
                .err()
                .ok_or_else(|| "expected parse failure".to_string())?;
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "READYGATE_WEATHER_ENABLED"),
                "invalid boolean should surface as env override error",
            )
        })();

        clear_vars(&["READYGATE_WEATHER_ENABLED"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("READYGATE_IPAM_API_KEY", "ipam-secret-value");
        env::set_var("READYGATE_SERVER_BEARER_TOKEN", "bearer-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("ipam-secret-value"), "debug output should not contain api key")?;
            ensure(
                !debug.contains("bearer-secret-value"),
                "debug output should not contain bearer token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["READYGATE_IPAM_API_KEY", "READYGATE_SERVER_BEARER_TOKEN"]);
        result
    }
}
