//! Filesystem-as-IPC primitives: advisory locking, atomic JSON
//! save/load-with-recovery, the shared manifest, the append-only results
//! log, and the service-status file.

pub mod atomic;
pub mod error;
pub mod lock;
pub mod manifest;
pub mod results_log;
pub mod status_file;

pub use error::ManifestError;
pub use lock::FileLock;
pub use manifest::{ManifestStore, ManifestUpdate, UpdateValue};
pub use results_log::ResultsLog;
pub use status_file::StatusFile;
