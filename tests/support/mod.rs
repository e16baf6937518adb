//! Shared scaffolding for the cross-service scenario tests: a temp-dir
//! pipeline with a minimal config, matching the per-crate unit tests'
//! `minimal_config` builders but assembled once here since these tests
//! wire multiple services against the same directories.

use phorest_config::*;
use phorest_runtime::Paths;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub config: Config,
    pub paths: Paths,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = minimal_config(dir.path());
        let paths = Paths::from_config(&config);
        std::fs::create_dir_all(&paths.continuous_capture_dir).expect("create capture dir");
        std::fs::create_dir_all(&paths.results_dir).expect("create results dir");
        std::fs::create_dir_all(&paths.logs_dir).expect("create logs dir");
        Harness { dir, config, paths }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn with_buffer_size(mut self, n: u64) -> Self {
        self.config.buffer.image_buffer_size = n;
        self
    }

    pub fn with_remote_sync(mut self, enabled: bool) -> Self {
        self.config.services.enable_remote_sync = enabled;
        self
    }

    pub fn manifest(&self) -> phorest_manifest::ManifestStore {
        phorest_manifest::ManifestStore::new(&self.paths.manifest_path)
    }

    pub fn empty_roi_table(&self) {
        let _lock = phorest_manifest::FileLock::acquire(&self.paths.roi_manifest_path).expect("lock roi manifest");
        phorest_manifest::atomic::save_json(&self.paths.roi_manifest_path, &phorest_core::roi::RoiTable::default())
            .expect("write empty roi table");
    }
}

fn minimal_config(root: &std::path::Path) -> Config {
    Config {
        data_analysis: DataAnalysisConfig { method: AnalysisMethod::MaxIntensity, number_of_sub_rois: 0 },
        paths: PathsConfig {
            remote_root_dir: root.join("remote").to_string_lossy().to_string(),
            root_dir: root.to_string_lossy().to_string(),
            data_dir: root.join("data").to_string_lossy().to_string(),
            continuous_capture_dir: root.join("data/capture").to_string_lossy().to_string(),
            results_dir: root.join("results").to_string_lossy().to_string(),
            logs_dir: root.join("logs").to_string_lossy().to_string(),
            backup_dir: root.join("backup").to_string_lossy().to_string(),
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
            collector_retry_delay: 0,
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

pub fn write_test_png(path: &std::path::Path, seed: u8) {
    let img = image::GrayImage::from_fn(64, 64, |x, y| image::Luma([((x + y + seed as u32) * 3 % 256) as u8]));
    img.save(path).expect("write test png");
}
