use crate::manifest_entry::ManifestEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One line of `processing_results.jsonl`: the manifest entry as it stood
/// when the Processor finished with it, enriched with the Analysis
/// Kernel's output. Append-only — once written, a line is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    #[serde(flatten)]
    pub entry: ManifestEntry,
    #[serde(default)]
    pub image_analysis: Option<ImageAnalysisRecord>,
    #[serde(default)]
    pub temperature_readings: Option<HashMap<String, f64>>,
}

/// The Analysis Kernel's full return value for one image: the brightness
/// prelude plus one fit record per ROI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAnalysisRecord {
    pub brightness: f64,
    pub contrast: f64,
    pub rois: Vec<RoiFitRecord>,
}

/// Per-ROI postprocessed statistics, one entry per fitted parameter name
/// (e.g. `amplitude`, `mu`, `sigma`, `offset`, `error` for `gaussian`/`fano`;
/// a single `intensity`-named entry for `max_intensity`/`centre`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoiFitRecord {
    pub roi_label: String,
    pub analysis_method: String,
    pub stats: BTreeMap<String, RoiFitStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoiFitStat {
    /// Raw per-row values, kept only when debug mode is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    pub mean: f64,
    pub std: f64,
    pub lq: f64,
    pub median: f64,
    pub uq: f64,
    pub max: f64,
    pub min: f64,
    pub smoothness: f64,
}
