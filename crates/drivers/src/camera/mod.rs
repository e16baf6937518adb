mod dummy;
mod file_importer;
mod hawkeye;

pub use dummy::DummyCameraDriver;
pub use file_importer::FileImporterDriver;
pub use hawkeye::HawkeyeCameraDriver;

use crate::error::DriverError;
use async_trait::async_trait;
use image::GrayImage;
use phorest_core::manifest_entry::CameraData;
use std::path::{Path, PathBuf};

/// One acquired frame: the 8-bit grayscale pixel data plus the path it was
/// written to under `output_dir`.
pub struct Frame {
    pub path: PathBuf,
    pub image: GrayImage,
}

/// The single capability every camera backend implements. The five
/// original camera controllers (Logitech/Argus/TIS/Hawkeye/Dummy) all
/// returned the same `(status, message, metadata)` triple; here they are
/// five implementations of one trait instead of five near-duplicate
/// modules.
#[async_trait]
pub trait CameraDriver: Send + Sync {
    async fn acquire_frame(&self, output_dir: &Path, camera_index: i64) -> Result<(Frame, CameraData), DriverError>;
}

pub(crate) fn frame_filename(camera_index: i64, timestamp: chrono::DateTime<chrono::Utc>) -> String {
    format!("frame_{}_{}.png", camera_index, timestamp.format("%Y%m%d_%H%M%S_%3f"))
}
