//! `phorest status` — the minimal non-GUI surface for reading the
//! service-status file (spec.md §6, §1 excludes a TUI, not a way to read
//! the file the spec itself defines as an interface).

use crate::error::CliResult;
use chrono::Utc;
use phorest_config::Config;
use phorest_core::status::{RunState, ServiceName};
use phorest_manifest::StatusFile;
use phorest_runtime::Paths;
use std::path::Path;

pub fn run(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let paths = Paths::from_config(&config);
    let map = StatusFile::new(&paths.status_path).get_all()?;

    println!("{:<22}{:<10}{:<10}{}", "SERVICE", "STATUS", "PID", "LAST HEARTBEAT");
    for name in ServiceName::ALL {
        let status_text;
        let pid_text;
        let heartbeat_text;
        match map.get(&name) {
            Some(s) => {
                status_text = match s.status {
                    RunState::Running => "running".to_string(),
                    RunState::Stopped => "stopped".to_string(),
                };
                pid_text = s.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
                heartbeat_text = match s.last_heartbeat {
                    Some(hb) => format!("{} ({}s ago)", hb.to_rfc3339(), (Utc::now() - hb).num_seconds().max(0)),
                    None => "-".to_string(),
                };
            }
            None => {
                status_text = "unknown".to_string();
                pid_text = "-".to_string();
                heartbeat_text = "-".to_string();
            }
        }
        println!("{:<22}{:<10}{:<10}{}", name.to_string(), status_text, pid_text, heartbeat_text);
    }
    Ok(())
}
