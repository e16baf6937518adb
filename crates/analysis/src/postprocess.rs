use crate::methods::{centre, fano, gaussian, max_intensity};
use phorest_core::result::{RoiFitRecord, RoiFitStat};
use std::collections::BTreeMap;
use tracing::warn;

/// The four configured row-fitting methods, named exactly as the config's
/// `[Data_Analysis].method` values so the dispatch table is a straight
/// lookup, not a translation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMethod {
    MaxIntensity,
    Centre,
    Gaussian,
    Fano,
}

impl AnalysisMethod {
    pub fn name(self) -> &'static str {
        match self {
            AnalysisMethod::MaxIntensity => "max_intensity",
            AnalysisMethod::Centre => "centre",
            AnalysisMethod::Gaussian => "gaussian",
            AnalysisMethod::Fano => "fano",
        }
    }
}

/// Row-by-row analysis of one ROI: rows whose standard deviation is below
/// `0.1` (flat/dark) are skipped before the method even runs; the method
/// itself may additionally fail (nonlinear fits only) and is skipped the
/// same way. Surviving per-parameter values are collected for
/// [`postprocess`]. Returns `None` only when every row was skipped (the
/// record still has a name, just no statistics to report).
pub fn analyse_roi_data(roi_label: &str, method: AnalysisMethod, rows: &[Vec<f64>], debug_mode: bool) -> RoiFitRecord {
    let mut raw: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut error_count = 0usize;

    for (idx, row) in rows.iter().enumerate() {
        let std = std_dev(row);
        if std < 0.1 {
            error_count += 1;
            continue;
        }
        let result = match method {
            AnalysisMethod::MaxIntensity => Some(max_intensity(row)),
            AnalysisMethod::Centre => Some(centre(row)),
            AnalysisMethod::Gaussian => gaussian(row),
            AnalysisMethod::Fano => fano(row),
        };
        let Some(result) = result else {
            warn!(roi_label, row = idx, "fitting function failed");
            error_count += 1;
            continue;
        };
        for (key, value) in result {
            if value.is_nan() {
                continue;
            }
            raw.entry(key).or_default().push(value);
        }
    }

    if rows.is_empty() {
        warn!(roi_label, "ROI had zero rows to analyse");
    } else if error_count as f64 / rows.len() as f64 > 0.5 {
        warn!(roi_label, error_count, total = rows.len(), "more than half of rows excluded from analysis");
    }

    RoiFitRecord {
        roi_label: roi_label.to_string(),
        analysis_method: method.name().to_string(),
        stats: postprocess(raw, debug_mode),
    }
}

/// Statistical summary per surviving parameter: mean, std, quartiles,
/// min/max and smoothness (`std(diff(values)) / range`, `0` when the range
/// is `0`). Every numeric output is rounded to 3 decimals. Raw values are
/// dropped unless `debug_mode` is set.
pub fn postprocess(raw: BTreeMap<String, Vec<f64>>, debug_mode: bool) -> BTreeMap<String, RoiFitStat> {
    let mut out = BTreeMap::new();
    for (key, values) in raw {
        if values.is_empty() {
            continue;
        }
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let range = max - min;
        let smoothness = if range == 0.0 {
            0.0
        } else {
            std_dev(&diff(&values)) / range
        };
        let stat = RoiFitStat {
            values: if debug_mode { Some(values.clone()) } else { None },
            mean: round3(mean(&values)),
            std: round3(std_dev(&values)),
            lq: round3(quantile(&values, 0.25)),
            median: round3(quantile(&values, 0.50)),
            uq: round3(quantile(&values, 0.75)),
            max: round3(max),
            min: round3(min),
            smoothness: round3(smoothness),
        };
        out.insert(key, stat);
    }
    out
}

fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Linear-interpolation quantile, matching `numpy.quantile`'s default
/// method.
pub(crate) fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_rows_are_all_rejected_without_crashing() {
        let rows = vec![vec![5.0; 10]; 4];
        let record = analyse_roi_data("L1", AnalysisMethod::MaxIntensity, &rows, false);
        assert!(record.stats.is_empty());
    }

    #[test]
    fn smoothness_is_zero_when_range_is_zero() {
        let mut raw = BTreeMap::new();
        raw.insert("max_intensity".to_string(), vec![3.0, 3.0, 3.0]);
        let stats = postprocess(raw, false);
        assert_eq!(stats["max_intensity"].smoothness, 0.0);
    }

    #[test]
    fn values_are_dropped_unless_debug_mode() {
        let mut raw = BTreeMap::new();
        raw.insert("max_intensity".to_string(), vec![1.0, 2.0, 3.0]);
        let stats = postprocess(raw.clone(), false);
        assert!(stats["max_intensity"].values.is_none());
        let debug_stats = postprocess(raw, true);
        assert!(debug_stats["max_intensity"].values.is_some());
    }

    #[test]
    fn analyse_roi_data_threads_debug_mode_into_postprocess() {
        let rows = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]; 3];
        let record = analyse_roi_data("L1", AnalysisMethod::MaxIntensity, &rows, true);
        let stat = record.stats.values().next().unwrap();
        assert!(stat.values.is_some());
    }

    #[test]
    fn median_matches_numpy_linear_interpolation_convention() {
        let mut raw = BTreeMap::new();
        raw.insert("x".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        let stats = postprocess(raw, false);
        assert_eq!(stats["x"].median, 2.5);
    }
}
