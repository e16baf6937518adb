use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("camera acquisition failed: {0}")]
    Acquire(String),
    #[error("no staged file available in {0}")]
    NoStagedFile(PathBuf),
    #[error("subprocess '{cmd}' failed: {detail}")]
    Subprocess { cmd: String, detail: String },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("thermocouple read failed: {0}")]
    Thermocouple(String),
}
