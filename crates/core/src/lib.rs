pub mod config;
pub mod domain;
pub mod errors;
pub mod readiness;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::recommendation::{Recommendation, Verdict};
pub use domain::request::EvaluationRequest;
pub use domain::signal::{SignalKind, SignalResult, SignalState};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use readiness::{
    CapacityCounts, CapacitySource, CapacityThresholds, StaticInventory, WeatherObservation,
    WeatherThresholds,
};
