use crate::error::ManifestError;
use crate::lock::FileLock;
use phorest_core::result::ResultRecord;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// `processing_results.jsonl`: append-only, one [`ResultRecord`] per line.
/// Entries are immutable once written, so appends are a line-append under
/// lock rather than a full-file load-mutate-save like the manifest.
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ResultsLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ResultRecord) -> Result<(), ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ManifestError::Io { path: self.path.clone(), source })?;
        }
        let mut line = serde_json::to_vec(record)
            .map_err(|source| ManifestError::Serialize { path: self.path.clone(), source })?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| ManifestError::Io { path: self.path.clone(), source })?;
        file.write_all(&line).map_err(|source| ManifestError::Io { path: self.path.clone(), source })?;
        Ok(())
    }

    /// Reads every record currently on disk, under lock. Used by the
    /// Communicator to build its CSV and by tests asserting on log shape.
    pub fn read_all(&self) -> Result<Vec<ResultRecord>, ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path).map_err(|source| ManifestError::Io { path: self.path.clone(), source })?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|source| ManifestError::Io { path: self.path.clone(), source })?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ResultRecord = serde_json::from_str(&line)
                .map_err(|source| ManifestError::Serialize { path: self.path.clone(), source })?;
            records.push(record);
        }
        Ok(records)
    }
}
