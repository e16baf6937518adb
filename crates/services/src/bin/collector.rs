use phorest_drivers::{
    CameraDriver, DummyCameraDriver, DummyThermocoupleDriver, FileImporterDriver, HawkeyeCameraDriver, ThermocoupleDriver,
    W1ThermocoupleDriver,
};
use phorest_runtime::Bootstrap;
use phorest_services::collector::CollectorService;
use std::time::Duration;
use tracing::error;

const CONFIG_PATH: &str = "configs/Phorest_config.toml";

#[tokio::main]
async fn main() {
    // `bootstrap` is kept alive for the whole process: its `WorkerGuard`
    // must outlive every `tracing` call this service makes.
    let bootstrap = match Bootstrap::new("phorest-collector", CONFIG_PATH) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("phorest-collector: failed to start: {e}");
            std::process::exit(1);
        }
    };
    let config = bootstrap.config.clone();
    let paths = bootstrap.paths.clone();

    let camera: Box<dyn CameraDriver> = if !config.services.enable_camera {
        Box::new(DummyCameraDriver::new())
    } else {
        match config.camera.camera_type {
            phorest_config::CameraType::Hawkeye => Box::new(HawkeyeCameraDriver::new(
                1280,
                720,
                config.camera.camera_gain,
                config.camera.camera_brightness,
                config.camera.camera_contrast,
                config.camera.camera_exposure,
            )),
            phorest_config::CameraType::FileImporter => {
                Box::new(FileImporterDriver::new(paths.continuous_capture_dir.join("staging")))
            }
            _ => Box::new(DummyCameraDriver::new()),
        }
    };

    let thermocouple: Option<Box<dyn ThermocoupleDriver>> = if config.services.enable_thermocouple {
        if config.temperature.thermocouple_sensors.is_empty() {
            Some(Box::new(DummyThermocoupleDriver::new(Vec::new())))
        } else {
            Some(Box::new(W1ThermocoupleDriver::new("/sys/bus/w1/devices", config.temperature.thermocouple_sensors.clone())))
        }
    } else {
        None
    };

    let cadence = Duration::from_secs(config.timing.collector_interval);
    let status_file = phorest_manifest::StatusFile::new(&paths.status_path);
    if let Err(e) = status_file.initialise() {
        error!(error = %e, "failed to initialise status file");
    }

    let mut service = match CollectorService::new(config, paths, camera, thermocouple) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("phorest-collector: startup snapshot failed: {e}");
            std::process::exit(1);
        }
    };

    let fatal = phorest_runtime::harness::run(
        phorest_core::status::ServiceName::Collector,
        &status_file,
        cadence,
        &bootstrap.shutdown,
        || service.cycle(),
    )
    .await;

    if fatal {
        std::process::exit(1);
    }
}
