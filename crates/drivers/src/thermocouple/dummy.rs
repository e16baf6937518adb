use super::ThermocoupleDriver;
use crate::error::DriverError;
use async_trait::async_trait;
use chrono::Utc;
use phorest_core::manifest_entry::TemperatureData;
use std::collections::HashMap;

/// Reports a fixed temperature for every configured sensor name. Used for
/// tests and for running the pipeline without any w1 hardware attached.
pub struct DummyThermocoupleDriver {
    sensor_names: Vec<String>,
}

impl DummyThermocoupleDriver {
    pub fn new(sensor_names: Vec<String>) -> Self {
        DummyThermocoupleDriver { sensor_names }
    }
}

#[async_trait]
impl ThermocoupleDriver for DummyThermocoupleDriver {
    async fn read_temperatures(&self) -> Result<TemperatureData, DriverError> {
        let data: HashMap<String, f64> = self.sensor_names.iter().map(|name| (name.clone(), 25.0)).collect();
        Ok(TemperatureData { timestamp_iso: Utc::now(), data, error_flag: false, error_message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_every_configured_sensor() {
        let driver = DummyThermocoupleDriver::new(vec!["Sensor 1".to_string(), "Sensor 2".to_string()]);
        let reading = driver.read_temperatures().await.unwrap();
        assert_eq!(reading.data.len(), 2);
        assert!(!reading.error_flag);
    }
}
