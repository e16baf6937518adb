use thiserror::Error;

/// Cycle-level failures every service can hit. Per spec §7's propagation
/// rule, a `ServiceError` never aborts the process on its own — the
/// runtime harness logs it and re-enters the idle/waiting state. Only the
/// Collector's failure-limit path escalates to `CycleOutcome::Fatal`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Manifest(#[from] phorest_manifest::ManifestError),
    #[error(transparent)]
    Driver(#[from] phorest_drivers::DriverError),
    #[error(transparent)]
    Analysis(#[from] phorest_analysis::error::AnalysisError),
    #[error(transparent)]
    Roi(#[from] phorest_roi::RoiError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("plot rendering failed: {0}")]
    Plot(String),
}
