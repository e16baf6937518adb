use phorest_config::Config;
use std::path::{Path, PathBuf};

/// Every filesystem location the pipeline touches, resolved once from
/// [`Config::paths`] at service startup. Every other crate is handed
/// concrete `PathBuf`s rather than reaching back into `Config` itself.
#[derive(Debug, Clone)]
pub struct Paths {
    pub root_dir: PathBuf,
    pub data_dir: PathBuf,
    pub continuous_capture_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub remote_root_dir: PathBuf,

    pub manifest_path: PathBuf,
    pub status_path: PathBuf,
    pub roi_manifest_path: PathBuf,
    pub results_log_path: PathBuf,
    pub csv_path: PathBuf,
    pub plot_path: PathBuf,
    pub health_report_path: PathBuf,

    pub data_ready_flag: PathBuf,
    pub results_ready_flag: PathBuf,

    pub remote_data_dir: PathBuf,
    pub remote_results_dir: PathBuf,
    pub remote_backup_dir: PathBuf,
}

impl Paths {
    pub fn from_config(config: &Config) -> Self {
        let root_dir = PathBuf::from(&config.paths.root_dir);
        let data_dir = PathBuf::from(&config.paths.data_dir);
        let continuous_capture_dir = PathBuf::from(&config.paths.continuous_capture_dir);
        let results_dir = PathBuf::from(&config.paths.results_dir);
        let logs_dir = PathBuf::from(&config.paths.logs_dir);
        let backup_dir = PathBuf::from(&config.paths.backup_dir);
        let remote_root_dir = PathBuf::from(&config.paths.remote_root_dir);

        let manifest_path = data_dir.join("metadata_manifest.json");
        let status_path = data_dir.join("pipeline_status.json");
        let roi_manifest_path = data_dir.join(&config.paths.roi_manifest_filename);
        let results_log_path = results_dir.join("processing_results.jsonl");
        let csv_path = results_dir.join("communicating_results.csv");
        let plot_path = results_dir.join("processed_data_plot.png");
        let health_report_path = results_dir.join("health_report.png");

        let data_ready_flag = data_dir.join("data_ready");
        let results_ready_flag = data_dir.join("results_ready");

        let remote_data_dir = remote_dir_for(&remote_root_dir, &data_dir);
        let remote_results_dir = remote_dir_for(&remote_root_dir, &results_dir);
        let remote_backup_dir = remote_dir_for(&remote_root_dir, &backup_dir);

        Paths {
            root_dir,
            data_dir,
            continuous_capture_dir,
            results_dir,
            logs_dir,
            backup_dir,
            remote_root_dir,
            manifest_path,
            status_path,
            roi_manifest_path,
            results_log_path,
            csv_path,
            plot_path,
            health_report_path,
            data_ready_flag,
            results_ready_flag,
            remote_data_dir,
            remote_results_dir,
            remote_backup_dir,
        }
    }

    pub fn log_file(&self, service_name: &str) -> PathBuf {
        self.logs_dir.join(format!("{service_name}.log"))
    }
}

fn remote_dir_for(remote_root: &Path, local: &Path) -> PathBuf {
    let name = local.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    remote_root.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phorest_config::*;
    use std::collections::HashMap;

    fn minimal_config() -> Config {
        Config {
            data_analysis: DataAnalysisConfig { method: AnalysisMethod::MaxIntensity, number_of_sub_rois: 0 },
            paths: PathsConfig {
                remote_root_dir: "/remote".into(),
                root_dir: "/opt/phorest".into(),
                data_dir: "/opt/phorest/data".into(),
                continuous_capture_dir: "/opt/phorest/data/capture".into(),
                results_dir: "/opt/phorest/results".into(),
                logs_dir: "/opt/phorest/logs".into(),
                backup_dir: "/opt/phorest/backup".into(),
                roi_manifest_filename: "roi_manifest.json".into(),
            },
            services: ServicesConfig {
                enable_camera: true,
                enable_thermocouple: false,
                enable_brightfield: false,
                enable_file_backup: true,
                enable_image_compression: true,
                enable_remote_sync: false,
                enable_service_health_check: true,
            },
            timing: TimingConfig {
                collector_interval: 1,
                processor_interval: 1,
                communicator_interval: 5,
                compress_interval: 30,
                poll_interval: 1,
                collector_retry_delay: 2,
                file_backup_interval: 3600,
                sync_interval: 3600,
            },
            retries: RetriesConfig { collector_failure_limit: 5 },
            buffer: BufferConfig { image_buffer_size: 500 },
            communication: CommunicationConfig { method: CommunicationMethod::CsvPlot },
            camera: CameraConfig {
                camera_type: CameraType::Dummy,
                camera_id: 0,
                camera_exposure: 0,
                camera_gain: 0,
                camera_brightness: 0,
                camera_contrast: 0,
                camera_transform: CameraTransform::None,
            },
            temperature: TemperatureConfig { thermocouple_sensors: HashMap::new() },
            storage: StorageConfig { usb_uuid: "0000-0000".into() },
            assets: AssetsConfig {
                roi_generation_image: "assets/reference.png".into(),
                label_template_dir: "assets/templates".into(),
                feature_locations_config: "assets/feature_locations.json".into(),
                roi_manifest_filename: "roi_manifest.json".into(),
                generated_files_dir: "assets/generated".into(),
            },
            development: DevelopmentConfig { debug_mode: false },
            brightfield: BrightfieldConfig { camera_id: None },
        }
    }

    #[test]
    fn derives_remote_dirs_from_local_basenames() {
        let paths = Paths::from_config(&minimal_config());
        assert_eq!(paths.remote_data_dir, PathBuf::from("/remote/data"));
        assert_eq!(paths.remote_results_dir, PathBuf::from("/remote/results"));
        assert_eq!(paths.remote_backup_dir, PathBuf::from("/remote/backup"));
    }

    #[test]
    fn manifest_and_status_live_under_data_dir() {
        let paths = Paths::from_config(&minimal_config());
        assert_eq!(paths.manifest_path, PathBuf::from("/opt/phorest/data/metadata_manifest.json"));
        assert_eq!(paths.status_path, PathBuf::from("/opt/phorest/data/pipeline_status.json"));
    }
}
