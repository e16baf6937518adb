use phorest_runtime::Bootstrap;
use phorest_services::backup::BackupService;
use std::time::Duration;
use tracing::error;

const CONFIG_PATH: &str = "configs/Phorest_config.toml";

#[tokio::main]
async fn main() {
    let bootstrap = match Bootstrap::new("phorest-backup", CONFIG_PATH) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("phorest-backup: failed to start: {e}");
            std::process::exit(1);
        }
    };
    let config = bootstrap.config.clone();
    let paths = bootstrap.paths.clone();
    let cadence = Duration::from_secs(config.timing.file_backup_interval);

    let status_file = phorest_manifest::StatusFile::new(&paths.status_path);
    if let Err(e) = status_file.initialise() {
        error!(error = %e, "failed to initialise status file");
    }

    if !config.services.enable_file_backup {
        if let Err(e) = status_file.update(phorest_core::status::ServiceName::Backup, phorest_core::status::RunState::Stopped, None, None) {
            error!(error = %e, "failed to record disabled backup service as stopped");
        }
        return;
    }

    let mut service = BackupService::new(config, paths);

    let fatal = phorest_runtime::harness::run(
        phorest_core::status::ServiceName::Backup,
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
