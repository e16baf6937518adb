use super::ThermocoupleDriver;
use crate::error::DriverError;
use async_trait::async_trait;
use chrono::Utc;
use phorest_core::manifest_entry::TemperatureData;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const POLL_ATTEMPTS: usize = 5;
const POLL_DELAY: Duration = Duration::from_millis(200);

/// Reads DS18B20-style one-wire thermocouples through the kernel's `w1`
/// sysfs interface, one device file per configured sensor id.
pub struct W1ThermocoupleDriver {
    device_root: PathBuf,
    /// `w1 device id -> human-readable name`, matching configuration order.
    sensors: Vec<(String, String)>,
}

impl W1ThermocoupleDriver {
    pub fn new(device_root: impl Into<PathBuf>, sensors: HashMap<String, String>) -> Self {
        let mut sensors: Vec<(String, String)> = sensors.into_iter().collect();
        sensors.sort();
        W1ThermocoupleDriver { device_root: device_root.into(), sensors }
    }

    fn device_file(&self, device_id: &str) -> PathBuf {
        self.device_root.join(device_id).join("w1_slave")
    }

    fn check_connections(&self) -> Result<(), DriverError> {
        for (device_id, name) in &self.sensors {
            if !self.device_file(device_id).exists() {
                return Err(DriverError::Thermocouple(format!("device {device_id} ({name}) not found at {}", self.device_root.display())));
            }
        }
        Ok(())
    }

    async fn read_one(&self, device_id: &str) -> Result<f64, DriverError> {
        let path = self.device_file(device_id);
        for attempt in 0..POLL_ATTEMPTS {
            let contents = tokio::fs::read_to_string(&path).await.map_err(|e| DriverError::Thermocouple(e.to_string()))?;
            let mut lines = contents.lines();
            let crc_line = lines.next().ok_or_else(|| DriverError::Thermocouple(format!("empty w1_slave for {device_id}")))?;
            if crc_line.trim_end().ends_with("YES") {
                let temp_line = lines
                    .next()
                    .ok_or_else(|| DriverError::Thermocouple(format!("missing temperature line for {device_id}")))?;
                let pos = temp_line
                    .find("t=")
                    .ok_or_else(|| DriverError::Thermocouple(format!("no 't=' field for {device_id}")))?;
                let millidegrees: f64 = temp_line[pos + 2..]
                    .trim()
                    .parse()
                    .map_err(|_| DriverError::Thermocouple(format!("unparseable temperature for {device_id}")))?;
                return Ok(millidegrees / 1000.0);
            }
            if attempt + 1 < POLL_ATTEMPTS {
                tokio::time::sleep(POLL_DELAY).await;
            }
        }
        Err(DriverError::Thermocouple(format!("CRC never valid for {device_id} after {POLL_ATTEMPTS} attempts")))
    }
}

#[async_trait]
impl ThermocoupleDriver for W1ThermocoupleDriver {
    async fn read_temperatures(&self) -> Result<TemperatureData, DriverError> {
        let timestamp = Utc::now();
        if let Err(e) = self.check_connections() {
            warn!(error = %e, "thermocouple device connection check failed");
            return Ok(TemperatureData { timestamp_iso: timestamp, data: HashMap::new(), error_flag: true, error_message: Some(e.to_string()) });
        }

        let mut data = HashMap::new();
        for (device_id, name) in &self.sensors {
            match self.read_one(device_id).await {
                Ok(celsius) => {
                    data.insert(name.clone(), celsius);
                }
                Err(e) => {
                    warn!(device_id, error = %e, "failed to read thermocouple");
                    return Ok(TemperatureData { timestamp_iso: timestamp, data, error_flag: true, error_message: Some(e.to_string()) });
                }
            }
        }
        Ok(TemperatureData { timestamp_iso: timestamp, data, error_flag: false, error_message: None })
    }
}
