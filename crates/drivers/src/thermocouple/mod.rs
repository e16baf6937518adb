mod dummy;
mod w1;

pub use dummy::DummyThermocoupleDriver;
pub use w1::W1ThermocoupleDriver;

use crate::error::DriverError;
use async_trait::async_trait;
use phorest_core::manifest_entry::TemperatureData;

/// The single capability every thermocouple backend implements: read every
/// configured sensor and return one timestamped reading set.
#[async_trait]
pub trait ThermocoupleDriver: Send + Sync {
    async fn read_temperatures(&self) -> Result<TemperatureData, DriverError>;
}
