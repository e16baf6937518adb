use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One element of the shared manifest: everything known about a single
/// captured frame, plus the lifecycle flags the downstream services use to
/// decide whether they still owe it work.
///
/// Order in the manifest array is insertion order; that ordering is itself
/// domain truth (used by ring-buffer eviction) and must never be re-sorted
/// on load or save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub entry_timestamp_iso: DateTime<Utc>,

    #[serde(default)]
    pub collection_error: bool,
    #[serde(default)]
    pub collection_error_msg: Option<String>,

    #[serde(default)]
    pub camera_data: Option<CameraData>,
    #[serde(default)]
    pub temperature_data: Option<TemperatureData>,

    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub processing_timestamp_iso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing_error: bool,
    #[serde(default)]
    pub processing_error_msg: Option<String>,

    /// Set `true` by the Compressor regardless of whether compression
    /// actually succeeded for this entry.
    #[serde(default)]
    pub compression_attempted: bool,
    /// Populated by the Compressor on success; `camera_data.filename` is
    /// also rewritten in place so downstream readers never need this field.
    #[serde(default)]
    pub new_filename: Option<String>,

    /// Set `true` by the Communicator once this row has been folded into an
    /// emitted CSV.
    #[serde(default)]
    pub data_transmitted: bool,

    /// Set `true` by the Syncer once the image file has been moved remote.
    #[serde(default)]
    pub image_synced: bool,
    /// Populated by the Syncer on success.
    #[serde(default)]
    pub new_filepath: Option<String>,
}

impl ManifestEntry {
    /// A brand-new entry as produced by the Collector: `pending`, every
    /// flag false, every optional field absent except whatever the caller
    /// supplies.
    pub fn new(
        entry_timestamp_iso: DateTime<Utc>,
        camera_data: Option<CameraData>,
        temperature_data: Option<TemperatureData>,
    ) -> Self {
        let collection_error = camera_data.as_ref().map(|c| c.error_flag).unwrap_or(false);
        let collection_error_msg = camera_data
            .as_ref()
            .and_then(|c| c.error_message.clone());
        ManifestEntry {
            entry_timestamp_iso,
            collection_error,
            collection_error_msg,
            camera_data,
            temperature_data,
            processing_status: ProcessingStatus::Pending,
            processing_timestamp_iso: None,
            processing_error: false,
            processing_error_msg: None,
            compression_attempted: false,
            new_filename: None,
            data_transmitted: false,
            image_synced: false,
            new_filepath: None,
        }
    }

    /// Effective filename for this entry's image: the compressed name once
    /// the Compressor has rewritten it, otherwise whatever the Collector
    /// originally wrote.
    pub fn current_filename(&self) -> Option<&str> {
        self.camera_data.as_ref().map(|c| c.filename.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Processed | ProcessingStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraData {
    pub filename: String,
    pub filepath: String,
    pub timestamp_iso: DateTime<Utc>,
    pub camera_index: i64,
    #[serde(default)]
    pub error_flag: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemperatureData {
    pub timestamp_iso: DateTime<Utc>,
    pub data: HashMap<String, f64>,
    #[serde(default)]
    pub error_flag: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}
