use serde::{Deserialize, Serialize};

/// The physical layout of one chip design, in design coordinates: its
/// landmarks (for registration) and its gratings (the eventual ROIs).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChipMapping {
    pub chip_type: String,
    pub labels: Vec<ChipLabel>,
    pub gratings: Vec<Grating>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChipLabel {
    pub label: String,
    pub label_origin: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grating {
    pub label: String,
    pub grating_origin: [f64; 2],
    #[serde(rename = "x-size")]
    pub x_size: f64,
    #[serde(rename = "y-size")]
    pub y_size: f64,
}

/// The full set of known chip designs, looked up by `chip_type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChipMapDatabase {
    pub chip_mappings: Vec<ChipMapping>,
}

impl ChipMapDatabase {
    pub fn find(&self, chip_type: &str) -> Option<&ChipMapping> {
        self.chip_mappings.iter().find(|m| m.chip_type == chip_type)
    }
}

impl ChipMapping {
    pub fn label_origin(&self, label: &str) -> Option<[f64; 2]> {
        self.labels.iter().find(|l| l.label == label).map(|l| l.label_origin)
    }

    /// Chips in the `IMECII_2` family split each grating north/south
    /// instead of the standard east/west halves.
    pub fn splits_north_south(&self) -> bool {
        self.chip_type.contains("IMECII_2")
    }
}

/// One user-supplied landmark click plus everything the registration
/// pipeline accumulates about it across both refinement passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserFeature {
    pub label: String,
    pub user_location: [f64; 2],
    #[serde(default)]
    pub chip_location: Option<[f64; 2]>,
    #[serde(default)]
    pub refined_location: Option<[f64; 2]>,
    #[serde(default)]
    pub match_quality: f64,
    #[serde(default)]
    pub label_locating_success: bool,
    #[serde(default)]
    pub feature_offset: Option<[f64; 2]>,
}

/// The operator-supplied registration request: which chip type is in the
/// image, and where the operator clicked each landmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserChipMapping {
    pub chip_type: String,
    pub features: Vec<UserFeature>,
    #[serde(default)]
    pub rotation_angle: Option<f64>,
    #[serde(default)]
    pub scale_factor: Option<f64>,
    #[serde(default)]
    pub offset: Option<[f64; 2]>,
}
