//! Pure domain types shared by every Phorest service.
//!
//! Nothing in this crate touches the filesystem, a clock source, or a
//! process — it only describes the shapes that flow through the manifest,
//! the results log, and the service-status file.

pub mod manifest_entry;
pub mod result;
pub mod roi;
pub mod status;

pub use manifest_entry::{CameraData, ManifestEntry, ProcessingStatus, TemperatureData};
pub use result::{ImageAnalysisRecord, ResultRecord, RoiFitRecord, RoiFitStat};
pub use roi::{RoiEntry, RoiHalf, RoiTable};
pub use status::{ServiceName, ServiceStatus, ServiceStatusKind, ServiceStatusMap};
