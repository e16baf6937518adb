use crate::atomic::{load_json_or_recover, save_json};
use crate::error::ManifestError;
use crate::lock::FileLock;
use chrono::{DateTime, Utc};
use phorest_core::status::{RunState, ServiceName, ServiceStatus, ServiceStatusMap};
use std::path::{Path, PathBuf};

/// The service-status file: a locked JSON map written after every cycle of
/// every service, read by the health supervisor and the status CLI.
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StatusFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seeds an entry for every known service that doesn't already have
    /// one, without touching any existing entry. Safe to call on every
    /// startup: a service that was already `running` from a previous
    /// process keeps its recorded state until that process itself
    /// overwrites it.
    pub fn initialise(&self) -> Result<(), ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut map: ServiceStatusMap = load_json_or_recover(&self.path)?;
        for name in ServiceName::ALL {
            map.entry(name).or_insert_with(|| ServiceStatus::stopped(name));
        }
        save_json(&self.path, &map)
    }

    pub fn get_all(&self) -> Result<ServiceStatusMap, ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        load_json_or_recover(&self.path)
    }

    /// Read-modify-write in one locked span. The original performs an
    /// unlocked read (via a separately-locked helper) followed by an
    /// unlocked write, which races against a concurrent heartbeat from a
    /// different service; here the whole operation is one critical
    /// section so two services updating at once can never clobber each
    /// other's entry.
    pub fn update(
        &self,
        name: ServiceName,
        status: RunState,
        pid: Option<i32>,
        last_heartbeat: Option<DateTime<Utc>>,
    ) -> Result<(), ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut map: ServiceStatusMap = load_json_or_recover(&self.path)?;
        let entry = map.entry(name).or_insert_with(|| ServiceStatus::stopped(name));
        entry.status = status;
        entry.pid = pid;
        entry.last_heartbeat = last_heartbeat;
        entry.expected_cmd = name.expected_cmd().to_string();
        save_json(&self.path, &map)
    }
}
