use super::{CameraDriver, Frame};
use crate::error::DriverError;
use async_trait::async_trait;
use chrono::Utc;
use phorest_core::manifest_entry::CameraData;
use std::path::{Path, PathBuf};

/// Imports the next staged image file instead of driving a physical
/// camera — the collapse point for the original's `FILE_IMPORTER` source
/// and standalone image-file-importer path.
pub struct FileImporterDriver {
    staging_dir: PathBuf,
}

impl FileImporterDriver {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        FileImporterDriver { staging_dir: staging_dir.into() }
    }

    fn next_staged_file(&self) -> Result<PathBuf, DriverError> {
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(&self.staging_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        candidates.sort();
        candidates.into_iter().next().ok_or_else(|| DriverError::NoStagedFile(self.staging_dir.clone()))
    }
}

#[async_trait]
impl CameraDriver for FileImporterDriver {
    async fn acquire_frame(&self, output_dir: &Path, camera_index: i64) -> Result<(Frame, CameraData), DriverError> {
        let source = self.next_staged_file()?;
        let timestamp = Utc::now();
        let filename = source.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "imported.png".to_string());
        let dest = output_dir.join(&filename);

        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::copy(&source, &dest).await?;
        tokio::fs::remove_file(&source).await?;

        let image = image::open(&dest).map_err(|e| DriverError::Acquire(e.to_string()))?.to_luma8();

        let metadata = CameraData {
            filename,
            filepath: dest.to_string_lossy().to_string(),
            timestamp_iso: timestamp,
            camera_index,
            error_flag: false,
            error_message: None,
        };
        Ok((Frame { path: dest, image }, metadata))
    }
}
