use super::{frame_filename, CameraDriver, Frame};
use crate::error::DriverError;
use async_trait::async_trait;
use chrono::Utc;
use image::{GrayImage, Luma};
use phorest_core::manifest_entry::CameraData;
use std::path::Path;

/// Always returns the same fixed synthetic image. Used for tests and the
/// happy-path end-to-end scenario where no real camera is attached.
pub struct DummyCameraDriver {
    width: u32,
    height: u32,
}

impl DummyCameraDriver {
    pub fn new() -> Self {
        DummyCameraDriver { width: 640, height: 480 }
    }
}

impl Default for DummyCameraDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDriver for DummyCameraDriver {
    async fn acquire_frame(&self, output_dir: &Path, camera_index: i64) -> Result<(Frame, CameraData), DriverError> {
        let timestamp = Utc::now();
        let filename = frame_filename(camera_index, timestamp);
        let path = output_dir.join(&filename);

        let image = GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([(((x + y) % 256) as u8)])
        });
        tokio::fs::create_dir_all(output_dir).await?;
        image.save(&path).map_err(|e| DriverError::Acquire(e.to_string()))?;

        let metadata = CameraData {
            filename,
            filepath: path.to_string_lossy().to_string(),
            timestamp_iso: timestamp,
            camera_index,
            error_flag: false,
            error_message: None,
        };
        Ok((Frame { path, image }, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_a_png_and_reports_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let driver = DummyCameraDriver::new();
        let (frame, metadata) = driver.acquire_frame(dir.path(), 0).await.unwrap();
        assert!(frame.path.exists());
        assert!(!metadata.error_flag);
    }
}
