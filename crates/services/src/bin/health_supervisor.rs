use phorest_runtime::Bootstrap;
use phorest_services::health::{HealthSupervisorService, HEALTH_SUPERVISOR_INTERVAL_SECS};
use std::time::Duration;
use tracing::error;

const CONFIG_PATH: &str = "configs/Phorest_config.toml";

#[tokio::main]
async fn main() {
    let bootstrap = match Bootstrap::new("phorest-health-supervisor", CONFIG_PATH) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("phorest-health-supervisor: failed to start: {e}");
            std::process::exit(1);
        }
    };
    let config = bootstrap.config.clone();
    let paths = bootstrap.paths.clone();
    let cadence = Duration::from_secs(HEALTH_SUPERVISOR_INTERVAL_SECS);

    let status_file = phorest_manifest::StatusFile::new(&paths.status_path);
    if let Err(e) = status_file.initialise() {
        error!(error = %e, "failed to initialise status file");
    }

    if !config.services.enable_service_health_check {
        if let Err(e) = status_file.update(
            phorest_core::status::ServiceName::HealthSupervisor,
            phorest_core::status::RunState::Stopped,
            None,
            None,
        ) {
            error!(error = %e, "failed to record disabled health supervisor as stopped");
        }
        return;
    }

    let mut service = HealthSupervisorService::new(config, paths);

    let fatal = phorest_runtime::harness::run(
        phorest_core::status::ServiceName::HealthSupervisor,
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
