use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a per-process `tracing` subscriber writing to
/// `LOGS_DIR/<service_name>.log`, daily-rotated, with `RUST_LOG` (default
/// `info`) controlling verbosity. The returned [`WorkerGuard`] must be
/// held for the process's lifetime — dropping it stops the background
/// writer thread and silently truncates buffered log lines.
pub fn install(service_name: &str, logs_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;
    let file_appender = tracing_appender::rolling::daily(logs_dir, format!("{service_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(guard)
}
