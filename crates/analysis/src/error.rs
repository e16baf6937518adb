use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("image file missing: {0}")]
    MissingFile(PathBuf),
    #[error("image file too small to be a valid capture: {path} ({size} bytes)")]
    TooSmall { path: PathBuf, size: u64 },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("ROI '{0}' falls outside image bounds")]
    RoiOutOfBounds(String),
}
