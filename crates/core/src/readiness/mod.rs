pub mod bulletin;
pub mod capacity;
pub mod policy;
pub mod weather;

pub use capacity::{CapacityCounts, CapacitySource, CapacityThresholds, StaticInventory};
pub use policy::decide;
pub use weather::{WeatherObservation, WeatherThresholds};
