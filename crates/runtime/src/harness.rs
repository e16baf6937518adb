use crate::shutdown::ShutdownFlag;
use phorest_core::status::{RunState, ServiceName};
use phorest_manifest::StatusFile;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// What a single cycle of a service's state machine reported. Errors local
/// to one entry/file never reach here — only cycle-level outcomes do.
pub enum CycleOutcome {
    /// The cycle ran, successfully or not; the harness logs failures but
    /// keeps looping on its cadence.
    Continue,
    /// The service has exhausted its failure policy (e.g. Collector's
    /// `FAILURE_LIMIT`) and must exit the process with status 1.
    Fatal(String),
}

/// Drives one service's cadence loop: runs `cycle`, writes a heartbeat to
/// the status file, sleeps for whatever's left of `cadence`, and repeats
/// until a shutdown signal is observed at the next cycle boundary or the
/// cycle itself reports [`CycleOutcome::Fatal`]. Returns `true` if the
/// process should exit with status 1.
pub async fn run<F, Fut>(
    name: ServiceName,
    status_file: &StatusFile,
    cadence: Duration,
    shutdown: &ShutdownFlag,
    mut cycle: F,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CycleOutcome>,
{
    let pid = std::process::id() as i32;
    if let Err(e) = status_file.update(name, RunState::Running, Some(pid), None) {
        error!(service = %name, error = %e, "failed to record startup status");
    }

    let mut fatal = false;
    loop {
        if shutdown.requested() {
            info!(service = %name, "shutdown requested, exiting cleanly");
            break;
        }

        let cycle_start = Instant::now();
        match cycle().await {
            CycleOutcome::Continue => {}
            CycleOutcome::Fatal(reason) => {
                error!(service = %name, reason, "entering FATAL_ERROR, exiting");
                fatal = true;
            }
        }

        let heartbeat = chrono::Utc::now();
        if let Err(e) = status_file.update(name, RunState::Running, Some(pid), Some(heartbeat)) {
            error!(service = %name, error = %e, "failed to write heartbeat");
        }

        if fatal || shutdown.requested() {
            break;
        }

        let elapsed = cycle_start.elapsed();
        let remaining = cadence.saturating_sub(elapsed);
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }

    if let Err(e) = status_file.update(name, RunState::Stopped, None, None) {
        error!(service = %name, error = %e, "failed to write final stopped status");
    }
    fatal
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn stops_after_first_cycle_once_shutdown_is_already_requested() {
        let dir = tempfile::tempdir().unwrap();
        let status_file = StatusFile::new(dir.path().join("pipeline_status.json"));
        let shutdown = ShutdownFlag::new();
        shutdown.request();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();

        let fatal = run(ServiceName::Collector, &status_file, Duration::from_millis(1), &shutdown, move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                CycleOutcome::Continue
            }
        })
        .await;

        assert!(!fatal);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let status = status_file.get_all().unwrap();
        assert_eq!(status[&ServiceName::Collector].status, RunState::Stopped);
    }

    #[tokio::test]
    async fn fatal_outcome_stops_the_loop_and_reports_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let status_file = StatusFile::new(dir.path().join("pipeline_status.json"));
        let shutdown = ShutdownFlag::new();

        let fatal = run(ServiceName::Collector, &status_file, Duration::from_millis(1), &shutdown, || async {
            CycleOutcome::Fatal("driver failure limit reached".to_string())
        })
        .await;

        assert!(fatal);
    }
}
