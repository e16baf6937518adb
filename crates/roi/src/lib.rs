//! The ROI Generator: reference image + user-clicked landmarks + chip map
//! -> per-grating ROI table, via two-pass template-matching registration.

pub mod chipmap;
pub mod error;
pub mod generate;
pub mod geometry;
pub mod matching;

pub use chipmap::{ChipLabel, ChipMapDatabase, ChipMapping, Grating, UserChipMapping, UserFeature};
pub use error::RoiError;
pub use generate::generate_roi_table;
