use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoiError {
    #[error("chip type '{0}' not found in chip map database")]
    UnknownChipType(String),
    #[error("label '{0}' not found in chip mapping")]
    UnknownLabel(String),
    #[error("at least 2 landmarks are required, got {0}")]
    TooFewLandmarks(usize),
    #[error("zero distance between two chip-map landmarks, cannot compute scale factor")]
    ZeroChipDistance,
    #[error("template not found for chip '{chip_type}' label '{label}' at {path}")]
    MissingTemplate { chip_type: String, label: String, path: String },
    #[error("failed to decode template image: {0}")]
    TemplateDecode(#[from] image::ImageError),
    #[error("no landmarks passed the registration quality gate")]
    NoLandmarksRegistered,
}
