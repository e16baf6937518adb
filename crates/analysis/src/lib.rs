//! The Analysis Kernel: `image + ROI table -> per-ROI fit statistics`.
//!
//! Pure with respect to the filesystem aside from reading the one image
//! file it's given — no manifest, no locking, no service concerns. Those
//! live in `phorest-services`, which calls [`kernel::process_image`] once
//! per pending manifest entry.

pub mod error;
pub mod kernel;
pub mod methods;
pub mod postprocess;

pub use error::AnalysisError;
pub use kernel::{process_image, KernelConfig};
pub use postprocess::AnalysisMethod;
