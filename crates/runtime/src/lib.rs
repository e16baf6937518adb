//! The per-service process harness: config/paths bootstrap, logging
//! installation, signal-driven shutdown, cadence loop with heartbeat
//! writes. Generalizes the teacher daemon's single-process lifecycle
//! (`startup_inner`/`DaemonState::shutdown`) to one instantiation per
//! service binary rather than one long-lived daemon.

pub mod error;
pub mod flag;
pub mod harness;
pub mod logging;
pub mod paths;
pub mod shutdown;

pub use error::RuntimeError;
pub use harness::CycleOutcome;
pub use paths::Paths;
pub use shutdown::ShutdownFlag;

use phorest_config::Config;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Everything a service binary's `main` needs before it can enter its
/// cadence loop: loaded config, resolved paths, installed logging (the
/// returned guard must be held for the process's lifetime), and an armed
/// shutdown flag.
pub struct Bootstrap {
    pub config: Config,
    pub paths: Paths,
    pub shutdown: ShutdownFlag,
    _log_guard: WorkerGuard,
}

impl Bootstrap {
    /// Loads config, resolves paths, installs logging and signal handlers.
    /// Any failure here is the one fatal-on-startup path every service
    /// shares (spec §6: exit code 1 on config load failure).
    pub fn new(service_name: &str, config_path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let config = Config::load(config_path)?;
        let paths = Paths::from_config(&config);
        let log_guard = logging::install(service_name, &paths.logs_dir).map_err(RuntimeError::Logging)?;

        let shutdown = ShutdownFlag::new();
        shutdown.install_signal_handlers().map_err(RuntimeError::Signal)?;

        Ok(Bootstrap { config, paths, shutdown, _log_guard: log_guard })
    }
}
