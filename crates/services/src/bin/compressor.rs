use phorest_runtime::Bootstrap;
use phorest_services::compressor::CompressorService;
use std::time::Duration;
use tracing::error;

const CONFIG_PATH: &str = "configs/Phorest_config.toml";

#[tokio::main]
async fn main() {
    let bootstrap = match Bootstrap::new("phorest-compressor", CONFIG_PATH) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("phorest-compressor: failed to start: {e}");
            std::process::exit(1);
        }
    };
    let config = bootstrap.config.clone();
    let paths = bootstrap.paths.clone();
    let cadence = Duration::from_secs(config.timing.compress_interval);

    let status_file = phorest_manifest::StatusFile::new(&paths.status_path);
    if let Err(e) = status_file.initialise() {
        error!(error = %e, "failed to initialise status file");
    }

    let mut service = CompressorService::new(config, paths);

    let fatal = phorest_runtime::harness::run(
        phorest_core::status::ServiceName::Compressor,
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
