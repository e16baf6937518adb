//! Loads `configs/Phorest_config.toml` into a typed, immutable [`Config`].
//!
//! The original materializes its TOML file into process-wide module
//! constants at import time. Here the config is built once, at service
//! startup, and handed around by reference — fail-fast on a load error
//! rather than discovering a missing key mid-cycle.

mod error;

pub use error::ConfigError;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(rename = "Data_Analysis")]
    pub data_analysis: DataAnalysisConfig,
    #[serde(rename = "Paths")]
    pub paths: PathsConfig,
    #[serde(rename = "Services")]
    pub services: ServicesConfig,
    #[serde(rename = "Timing")]
    pub timing: TimingConfig,
    #[serde(rename = "Retries")]
    pub retries: RetriesConfig,
    #[serde(rename = "Buffer")]
    pub buffer: BufferConfig,
    #[serde(rename = "Communication")]
    pub communication: CommunicationConfig,
    #[serde(rename = "Camera")]
    pub camera: CameraConfig,
    #[serde(rename = "Temperature")]
    pub temperature: TemperatureConfig,
    #[serde(rename = "Storage")]
    pub storage: StorageConfig,
    #[serde(rename = "Assets")]
    pub assets: AssetsConfig,
    #[serde(rename = "Development", default)]
    pub development: DevelopmentConfig,
    #[serde(rename = "Brightfield", default)]
    pub brightfield: BrightfieldConfig,
}

impl Config {
    /// Parses and validates the TOML file at `path`. Any failure — missing
    /// file, malformed TOML, missing/mistyped key — is returned as a single
    /// `ConfigError`; callers are expected to log it and exit 1 (the only
    /// fatal-on-startup path every service shares).
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    MaxIntensity,
    Centre,
    Gaussian,
    Fano,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataAnalysisConfig {
    pub method: AnalysisMethod,
    pub number_of_sub_rois: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PathsConfig {
    pub remote_root_dir: String,
    pub root_dir: String,
    pub data_dir: String,
    pub continuous_capture_dir: String,
    pub results_dir: String,
    pub logs_dir: String,
    pub backup_dir: String,
    pub roi_manifest_filename: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServicesConfig {
    pub enable_camera: bool,
    pub enable_thermocouple: bool,
    pub enable_brightfield: bool,
    pub enable_file_backup: bool,
    pub enable_image_compression: bool,
    pub enable_remote_sync: bool,
    pub enable_service_health_check: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TimingConfig {
    pub collector_interval: u64,
    pub processor_interval: u64,
    pub communicator_interval: u64,
    pub compress_interval: u64,
    pub poll_interval: u64,
    pub collector_retry_delay: u64,
    pub file_backup_interval: u64,
    pub sync_interval: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetriesConfig {
    pub collector_failure_limit: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BufferConfig {
    pub image_buffer_size: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunicationMethod {
    CsvPlot,
    OpcUa,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommunicationConfig {
    pub method: CommunicationMethod,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraType {
    Logitech,
    Argus,
    Tis,
    Hawkeye,
    Dummy,
    FileImporter,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraTransform {
    None,
    HorizontalFlip,
    VerticalFlip,
    Rotate90Clockwise,
    Rotate90Counterclockwise,
    Rotate180,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CameraConfig {
    pub camera_type: CameraType,
    pub camera_id: i64,
    pub camera_exposure: i64,
    pub camera_gain: i64,
    pub camera_brightness: i64,
    pub camera_contrast: i64,
    pub camera_transform: CameraTransform,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TemperatureConfig {
    /// `w1 sensor id -> human-readable name`.
    pub thermocouple_sensors: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub usb_uuid: String,
}

/// [SUPPLEMENT] present in the original's `config.py` but dropped from the
/// distilled interface listing: the assets the ROI Generator and Collector
/// startup snapshot need.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AssetsConfig {
    pub roi_generation_image: String,
    pub label_template_dir: String,
    pub feature_locations_config: String,
    pub roi_manifest_filename: String,
    pub generated_files_dir: String,
}

/// [SUPPLEMENT] controls whether postprocessed stats retain raw per-row
/// `values` (spec §4.2).
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct DevelopmentConfig {
    #[serde(default)]
    pub debug_mode: bool,
}

/// [SUPPLEMENT] brightfield imaging is a secondary camera path gated by
/// `Services.enable_brightfield`; its only config particular is which
/// camera index to use.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct BrightfieldConfig {
    #[serde(default)]
    pub camera_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[Data_Analysis]
method = "gaussian"
number_of_sub_rois = 0

[Paths]
remote_root_dir = "/remote"
root_dir = "/opt/phorest"
data_dir = "/opt/phorest/data"
continuous_capture_dir = "/opt/phorest/data/capture"
results_dir = "/opt/phorest/results"
logs_dir = "/opt/phorest/logs"
backup_dir = "/opt/phorest/backup"
roi_manifest_filename = "roi_manifest.json"

[Services]
enable_camera = true
enable_thermocouple = false
enable_brightfield = false
enable_file_backup = true
enable_image_compression = true
enable_remote_sync = false
enable_service_health_check = true

[Timing]
collector_interval = 1
processor_interval = 1
communicator_interval = 5
compress_interval = 30
poll_interval = 1
collector_retry_delay = 2
file_backup_interval = 3600
sync_interval = 3600

[Retries]
collector_failure_limit = 5

[Buffer]
image_buffer_size = 500

[Communication]
method = "CSV_PLOT"

[Camera]
camera_type = "DUMMY"
camera_id = 0
camera_exposure = 0
camera_gain = 0
camera_brightness = 0
camera_contrast = 0
camera_transform = "NONE"

[Temperature]
thermocouple_sensors = {}

[Storage]
usb_uuid = "0000-0000"

[Assets]
roi_generation_image = "assets/reference.png"
label_template_dir = "assets/templates"
feature_locations_config = "assets/feature_locations.json"
roi_manifest_filename = "roi_manifest.json"
generated_files_dir = "assets/generated"
"#;

    #[test]
    fn loads_a_minimal_valid_config() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(MINIMAL.as_bytes()).unwrap();
        let cfg = Config::load(f.path()).unwrap();
        assert_eq!(cfg.data_analysis.method, AnalysisMethod::Gaussian);
        assert!(!cfg.development.debug_mode);
    }

    #[test]
    fn missing_file_is_a_config_error_not_a_panic() {
        let err = Config::load("/nonexistent/Phorest_config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"not valid toml {{{").unwrap();
        let err = Config::load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
