use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the ROI Generator, input to the Analysis Kernel.
///
/// Serializes as a flat JSON object: `image_angle` alongside every
/// `ROI_<label>_<suffix>` key, matching the wire shape the Processor reads.
/// A `BTreeMap` keeps key order stable (alphabetical) across save/load,
/// which keeps golden-file tests and CSV column ordering deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RoiTable {
    pub image_angle: f64,
    #[serde(flatten)]
    pub rois: BTreeMap<String, RoiEntry>,
}

impl RoiTable {
    pub fn roi_key(label: &str, half: RoiHalf) -> String {
        format!("ROI_{label}_{}", half.suffix())
    }

    pub fn insert(&mut self, label: &str, half: RoiHalf, entry: RoiEntry) {
        self.rois.insert(Self::roi_key(label, half), entry);
    }

    /// Only the keys that name an ROI (every key except `image_angle`,
    /// which `serde(flatten)` already routes away from `rois`).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RoiEntry)> {
        self.rois.iter()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoiEntry {
    pub label: String,
    pub flip: bool,
    /// `[y, x]` top-left corner, matching the original's row-major convention.
    pub coords: [i64; 2],
    /// `[h, w]`.
    pub size: [i64; 2],
}

/// Which half of a grating an ROI covers. Standard chips split east/west
/// (`A`/`B`); the `IMECII_2` chip family splits north/south (`N`/`S`)
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiHalf {
    East,
    West,
    North,
    South,
}

impl RoiHalf {
    pub fn suffix(self) -> &'static str {
        match self {
            RoiHalf::East => "A",
            RoiHalf::West => "B",
            RoiHalf::North => "N",
            RoiHalf::South => "S",
        }
    }

    /// The first half of a split always carries `flip = true` (so the
    /// grating's bow-tie midpoint lands at index 0 of both halves).
    pub fn flip(self) -> bool {
        matches!(self, RoiHalf::East | RoiHalf::North)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_flat_object_with_image_angle() {
        let mut t = RoiTable {
            image_angle: 5.2,
            rois: BTreeMap::new(),
        };
        t.insert(
            "L1",
            RoiHalf::East,
            RoiEntry {
                label: "L1".into(),
                flip: true,
                coords: [10, 20],
                size: [5, 100],
            },
        );
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["image_angle"], 5.2);
        assert!(v.get("ROI_L1_A").is_some());
    }

    #[test]
    fn east_and_north_halves_carry_the_flip_flag() {
        assert!(RoiHalf::East.flip());
        assert!(RoiHalf::North.flip());
        assert!(!RoiHalf::West.flip());
        assert!(!RoiHalf::South.flip());
    }
}
