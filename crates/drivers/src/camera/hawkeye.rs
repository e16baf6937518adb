use super::{frame_filename, CameraDriver, Frame};
use crate::error::DriverError;
use async_trait::async_trait;
use chrono::Utc;
use phorest_core::manifest_entry::CameraData;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

/// Drives the Pi-camera stack via `rpicam-jpeg` and decodes the result.
/// The only backend that shells out — kept as a command-invocation
/// capability rather than linking a camera library into the core pipeline,
/// per the spec's re-architecture advisory on subprocess-launched tools.
pub struct HawkeyeCameraDriver {
    width: u32,
    height: u32,
    gain: i64,
    brightness: i64,
    contrast: i64,
    exposure_seconds: i64,
}

impl HawkeyeCameraDriver {
    pub fn new(width: u32, height: u32, gain: i64, brightness: i64, contrast: i64, exposure_seconds: i64) -> Self {
        HawkeyeCameraDriver { width, height, gain, brightness, contrast, exposure_seconds }
    }
}

#[async_trait]
impl CameraDriver for HawkeyeCameraDriver {
    async fn acquire_frame(&self, output_dir: &Path, camera_index: i64) -> Result<(Frame, CameraData), DriverError> {
        tokio::fs::create_dir_all(output_dir).await?;
        let timestamp = Utc::now();
        let temp_jpeg = output_dir.join(format!("temp_capture_{}.jpg", timestamp.timestamp_millis()));

        let exposure_micros = self.exposure_seconds * 1_000_000;
        let output = Command::new("rpicam-jpeg")
            .arg("-c")
            .arg(camera_index.to_string())
            .arg("--output")
            .arg(&temp_jpeg)
            .arg("--nopreview")
            .arg("--width")
            .arg(self.width.to_string())
            .arg("--height")
            .arg(self.height.to_string())
            .arg("--gain")
            .arg(self.gain.to_string())
            .arg("--brightness")
            .arg(self.brightness.to_string())
            .arg("--contrast")
            .arg(self.contrast.to_string())
            .arg("--shutter")
            .arg(exposure_micros.to_string())
            .arg("--vflip")
            .arg("--timeout")
            .arg("100")
            .arg("--quality")
            .arg("93")
            .output()
            .await
            .map_err(|e| DriverError::Subprocess { cmd: "rpicam-jpeg".to_string(), detail: e.to_string() })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let _ = tokio::fs::remove_file(&temp_jpeg).await;
            return Err(DriverError::Subprocess {
                cmd: "rpicam-jpeg".to_string(),
                detail: format!("exit code {:?}: {stderr}", output.status.code()),
            });
        }
        if !temp_jpeg.exists() {
            return Err(DriverError::Acquire(format!("captured JPEG not found at {}", temp_jpeg.display())));
        }

        let decoded = image::open(&temp_jpeg).map_err(|e| DriverError::Acquire(e.to_string()))?;
        let gray = decoded.to_luma8();
        let _ = tokio::fs::remove_file(&temp_jpeg).await;

        if gray.pixels().all(|p| p.0[0] == 0) {
            warn!("captured frame is all black, check lighting/exposure");
        }

        let filename = frame_filename(camera_index, timestamp);
        let path = output_dir.join(&filename);
        gray.save(&path).map_err(|e| DriverError::Acquire(e.to_string()))?;
        info!(path = %path.display(), "hawkeye frame captured");

        let metadata = CameraData {
            filename,
            filepath: path.to_string_lossy().to_string(),
            timestamp_iso: timestamp,
            camera_index,
            error_flag: false,
            error_message: None,
        };
        Ok((Frame { path, image: gray }, metadata))
    }
}
