use crate::error::ServiceError;
use chrono::Utc;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use phorest_config::Config;
use phorest_core::status::{RunState, ServiceName, ServiceStatus, ServiceStatusKind};
use phorest_manifest::StatusFile;
use phorest_runtime::Paths;
use plotters::prelude::*;
use tracing::warn;

const LOG_TAIL_LINES: usize = 5;
/// The health supervisor isn't one of the cadences in `[Timing]` — it
/// runs on a fixed schedule independent of the pipeline it watches.
pub const HEALTH_SUPERVISOR_INTERVAL_SECS: u64 = 30;

/// Renders one row per known service into `health_report.png`: a status
/// classification derived from the status file plus a PID liveness and
/// command-name check, with a log tail attached to any non-green row.
pub struct HealthSupervisorService {
    config: Config,
    paths: Paths,
    status_file: StatusFile,
}

impl HealthSupervisorService {
    pub fn new(config: Config, paths: Paths) -> Self {
        let status_file = StatusFile::new(&paths.status_path);
        HealthSupervisorService { config, paths, status_file }
    }

    pub async fn cycle(&mut self) -> phorest_runtime::CycleOutcome {
        if let Err(e) = self.run_once() {
            warn!(error = %e, "health supervisor cycle failed");
        }
        phorest_runtime::CycleOutcome::Continue
    }

    fn run_once(&self) -> Result<(), ServiceError> {
        let map = self.status_file.get_all()?;
        let mut rows = Vec::new();
        for name in ServiceName::ALL {
            let status = map.get(&name).cloned().unwrap_or_else(|| ServiceStatus::stopped(name));
            let kind = self.classify(name, &status);
            let log_tail = if matches!(kind, ServiceStatusKind::RunningOk) { Vec::new() } else { self.tail_log(name) };
            rows.push((name, kind, log_tail));
        }
        self.render(&rows)
    }

    fn classify(&self, name: ServiceName, status: &ServiceStatus) -> ServiceStatusKind {
        if status.status == RunState::Stopped {
            return ServiceStatusKind::Stopped;
        }
        if let Some(pid) = status.pid {
            if !process_matches(pid, status.expected_cmd.as_str()) {
                return ServiceStatusKind::Crashed;
            }
        } else {
            return ServiceStatusKind::Crashed;
        }
        let Some(last_heartbeat) = status.last_heartbeat else {
            return ServiceStatusKind::NoHeartbeat;
        };
        let elapsed = (Utc::now() - last_heartbeat).num_milliseconds().max(0) as f64 / 1000.0;
        let interval = self.service_interval_secs(name) as f64;
        if elapsed > interval * 1.5 {
            return ServiceStatusKind::HungStaleHeartbeat;
        }
        ServiceStatusKind::RunningOk
    }

    fn service_interval_secs(&self, name: ServiceName) -> u64 {
        match name {
            ServiceName::Collector => self.config.timing.collector_interval,
            ServiceName::Processor => self.config.timing.processor_interval,
            ServiceName::Communicator => self.config.timing.communicator_interval,
            ServiceName::Compressor => self.config.timing.compress_interval,
            ServiceName::Backup => self.config.timing.file_backup_interval,
            ServiceName::Syncer => self.config.timing.sync_interval,
            ServiceName::HealthSupervisor => HEALTH_SUPERVISOR_INTERVAL_SECS,
        }
    }

    fn tail_log(&self, name: ServiceName) -> Vec<String> {
        let path = self.paths.log_file(name.expected_cmd());
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Vec::new();
        };
        let lines: Vec<&str> = contents.lines().collect();
        let start = lines.len().saturating_sub(LOG_TAIL_LINES);
        lines[start..].iter().map(|s| s.to_string()).collect()
    }

    fn render(&self, rows: &[(ServiceName, ServiceStatusKind, Vec<String>)]) -> Result<(), ServiceError> {
        let row_height = 90i32;
        let width = 1000u32;
        let height = (row_height as u32) * rows.len() as u32 + 40;
        let root = BitmapBackend::new(&self.paths.health_report_path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ServiceError::Plot(e.to_string()))?;

        for (i, (name, kind, log_tail)) in rows.iter().enumerate() {
            let y0 = 20 + (i as i32) * row_height;
            let color = status_color(*kind);
            root.draw(&Rectangle::new([(20, y0), (60, y0 + 40)], color.filled()))
                .map_err(|e| ServiceError::Plot(e.to_string()))?;
            let label = format!("{name}: {kind}");
            root.draw(&Text::new(label, (80, y0 + 10), ("sans-serif", 20)))
                .map_err(|e| ServiceError::Plot(e.to_string()))?;
            for (j, line) in log_tail.iter().enumerate() {
                root.draw(&Text::new(line.clone(), (80, y0 + 30 + (j as i32 + 1) * 14), ("monospace", 12)))
                    .map_err(|e| ServiceError::Plot(e.to_string()))?;
            }
        }

        root.present().map_err(|e| ServiceError::Plot(e.to_string()))?;
        Ok(())
    }
}

fn status_color(kind: ServiceStatusKind) -> RGBColor {
    match kind {
        ServiceStatusKind::RunningOk => RGBColor(0, 170, 0),
        ServiceStatusKind::Stopped => RGBColor(150, 150, 150),
        ServiceStatusKind::NoHeartbeat => RGBColor(230, 180, 0),
        ServiceStatusKind::HungStaleHeartbeat => RGBColor(230, 120, 0),
        ServiceStatusKind::Crashed => RGBColor(200, 0, 0),
    }
}

/// PID liveness + command-name check: the PID must exist (`kill(pid, 0)`
/// succeeding or returning `EPERM`, both of which mean "alive") and its
/// recorded argv[0] must match `expected_cmd`, so a reused PID picked up
/// by an unrelated process never registers as this service still running.
fn process_matches(pid: i32, expected_cmd: &str) -> bool {
    let alive = match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    };
    if !alive {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{pid}/cmdline")) {
        Ok(cmdline) => {
            let argv0 = cmdline.split('\0').next().unwrap_or("");
            argv0.ends_with(expected_cmd)
        }
        // /proc is unavailable (non-Linux test environment): fall back to
        // the liveness check alone rather than failing the whole check.
        Err(_) => true,
    }
}
