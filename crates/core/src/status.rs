use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The seven processes the health supervisor watches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    Collector,
    Processor,
    Communicator,
    Compressor,
    Backup,
    Syncer,
    HealthSupervisor,
}

impl ServiceName {
    pub const ALL: [ServiceName; 7] = [
        ServiceName::Collector,
        ServiceName::Processor,
        ServiceName::Communicator,
        ServiceName::Compressor,
        ServiceName::Backup,
        ServiceName::Syncer,
        ServiceName::HealthSupervisor,
    ];

    /// The binary name the process manager expects to see running under
    /// this service's recorded PID. Recorded in the status file at
    /// startup so renamed/wrapped binaries don't register as "crashed".
    pub fn expected_cmd(self) -> &'static str {
        match self {
            ServiceName::Collector => "phorest-collector",
            ServiceName::Processor => "phorest-processor",
            ServiceName::Communicator => "phorest-communicator",
            ServiceName::Compressor => "phorest-compressor",
            ServiceName::Backup => "phorest-backup",
            ServiceName::Syncer => "phorest-syncer",
            ServiceName::HealthSupervisor => "phorest-health-supervisor",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expected_cmd())
    }
}

/// The on-disk state the service itself writes: whether it believes it is
/// running, its own PID, and when it last completed a cycle. Classification
/// into "hung"/"crashed" is the health supervisor's job, not the service's
/// own — a service can only ever honestly claim `Running` or `Stopped`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceStatus {
    pub status: RunState,
    pub pid: Option<i32>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub expected_cmd: String,
}

impl ServiceStatus {
    pub fn starting(name: ServiceName, pid: i32) -> Self {
        ServiceStatus {
            status: RunState::Running,
            pid: Some(pid),
            last_heartbeat: None,
            expected_cmd: name.expected_cmd().to_string(),
        }
    }

    pub fn stopped(name: ServiceName) -> Self {
        ServiceStatus {
            status: RunState::Stopped,
            pid: None,
            last_heartbeat: None,
            expected_cmd: name.expected_cmd().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Stopped,
}

pub type ServiceStatusMap = BTreeMap<ServiceName, ServiceStatus>;

/// The health supervisor's classification of one service, derived from a
/// `ServiceStatus` plus the configured cadence and a liveness check — never
/// stored back into the status file itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatusKind {
    RunningOk,
    HungStaleHeartbeat,
    Crashed,
    Stopped,
    NoHeartbeat,
}

impl fmt::Display for ServiceStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatusKind::RunningOk => "Running OK",
            ServiceStatusKind::HungStaleHeartbeat => "Hung / Stale Heartbeat",
            ServiceStatusKind::Crashed => "Crashed",
            ServiceStatusKind::Stopped => "Stopped",
            ServiceStatusKind::NoHeartbeat => "No Heartbeat",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_status_map_round_trips_with_enum_keys() {
        let mut map = ServiceStatusMap::new();
        map.insert(
            ServiceName::Collector,
            ServiceStatus::starting(ServiceName::Collector, 123),
        );
        let s = serde_json::to_string(&map).unwrap();
        assert!(s.contains("\"collector\""));
        let back: ServiceStatusMap = serde_json::from_str(&s).unwrap();
        assert_eq!(back, map);
    }
}
