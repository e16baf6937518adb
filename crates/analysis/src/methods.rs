use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{storage::Owned, Dyn, OMatrix, OVector, U4, U5};
use std::collections::BTreeMap;

/// One row's raw fit result: the named parameters a method produced, plus
/// `error` (RMSE) for the two nonlinear fits. Row rejection and "fit
/// failed" are both represented by `None` from the method function itself,
/// never by a panic.
pub type RowFit = BTreeMap<String, f64>;

/// Root-mean-square error between the raw row and its fitted
/// reconstruction.
pub fn rmse(data: &[f64], fitted: &[f64]) -> f64 {
    let n = data.len() as f64;
    let sum_sq: f64 = data.iter().zip(fitted).map(|(a, b)| (a - b).powi(2)).sum();
    (sum_sq / n).sqrt()
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn std_dev(data: &[f64]) -> f64 {
    let m = mean(data);
    (data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64).sqrt()
}

fn argmax(data: &[f64]) -> usize {
    data.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Column index of the brightest pixel in the row.
pub fn max_intensity(data: &[f64]) -> RowFit {
    let mut out = RowFit::new();
    out.insert("max_intensity".to_string(), argmax(data) as f64);
    out
}

/// Centre-of-mass of the row, restricted to pixels above `mean + 3*std`
/// (everything else is zeroed before the weighted sum).
pub fn centre(data: &[f64]) -> RowFit {
    let threshold = std_dev(data) * 3.0 + mean(data);
    let weighted: f64 = data
        .iter()
        .enumerate()
        .map(|(i, &v)| if v < threshold { 0.0 } else { v * (i + 1) as f64 })
        .sum();
    let total: f64 = data.iter().map(|&v| if v < threshold { 0.0 } else { v }).sum();
    let mut out = RowFit::new();
    out.insert("centre".to_string(), weighted / total);
    out
}

fn gaussian_func(x: f64, a: f64, mu: f64, sigma: f64, offset: f64) -> f64 {
    a * (-((x - mu).powi(2)) / (2.0 * sigma * sigma)).exp() + offset
}

/// Nonlinear least-squares fit of `a*exp(-(x-mu)^2/2sigma^2) + c`. Returns
/// `None` on fit failure (non-convergence, `NaN` in the result), matching
/// the original's "empty dict on failure" convention.
pub fn gaussian(data: &[f64]) -> Option<RowFit> {
    let xdata: Vec<f64> = (0..data.len()).map(|i| i as f64).collect();
    let data_max = data.iter().cloned().fold(f64::MIN, f64::max);
    let data_min = data.iter().cloned().fold(f64::MAX, f64::min);
    let p0 = OVector::<f64, U4>::from_row_slice(&[
        data_max - data_min,
        argmax(data) as f64,
        1.0,
        mean(data),
    ]);

    let problem = GaussianProblem { x: xdata.clone(), y: data.to_vec(), p: p0 };
    let (result, report) = LevenbergMarquardt::new().minimize(problem);
    if !report.termination.was_successful() {
        return None;
    }
    let popt = result.params();
    if popt.iter().any(|v| v.is_nan()) {
        return None;
    }
    let fitted: Vec<f64> = xdata.iter().map(|&x| gaussian_func(x, popt[0], popt[1], popt[2], popt[3])).collect();

    let mut out = RowFit::new();
    out.insert("amplitude".to_string(), popt[0]);
    out.insert("mu".to_string(), popt[1]);
    out.insert("sigma".to_string(), popt[2]);
    out.insert("offset".to_string(), popt[3]);
    out.insert("error".to_string(), rmse(data, &fitted));
    Some(out)
}

fn fano_func(x: f64, amp: f64, assym: f64, res: f64, gamma: f64, offset: f64) -> f64 {
    let num = (assym * gamma + (x - res)).powi(2);
    let den = gamma * gamma + (x - res).powi(2);
    amp * (num / den) + offset
}

/// Nonlinear least-squares fit of the asymmetric Fano line-shape.
pub fn fano(data: &[f64]) -> Option<RowFit> {
    let xdata: Vec<f64> = (0..data.len()).map(|i| i as f64).collect();
    let data_max = data.iter().cloned().fold(f64::MIN, f64::max);
    let data_min = data.iter().cloned().fold(f64::MAX, f64::min);
    let p0 = OVector::<f64, U5>::from_row_slice(&[
        data_max - data_min,
        0.0,
        argmax(data) as f64,
        data.len() as f64 / 4.0,
        mean(data),
    ]);

    let problem = FanoProblem { x: xdata.clone(), y: data.to_vec(), p: p0 };
    let (result, report) = LevenbergMarquardt::new().minimize(problem);
    if !report.termination.was_successful() {
        return None;
    }
    let popt = result.params();
    if popt.iter().any(|v| v.is_nan()) {
        return None;
    }
    let fitted: Vec<f64> = xdata
        .iter()
        .map(|&x| fano_func(x, popt[0], popt[1], popt[2], popt[3], popt[4]))
        .collect();

    let mut out = RowFit::new();
    out.insert("amplitude".to_string(), popt[0]);
    out.insert("assymetry".to_string(), popt[1]);
    out.insert("resonance".to_string(), popt[2]);
    out.insert("gamma".to_string(), popt[3]);
    out.insert("offset".to_string(), popt[4]);
    out.insert("error".to_string(), rmse(data, &fitted));
    Some(out)
}

/// Central-difference step used for every numeric Jacobian below — scipy's
/// `curve_fit` defaults to a numerical Jacobian too, so this mirrors the
/// original's behavior rather than deriving analytic gradients.
const JAC_EPS: f64 = 1e-6;

struct GaussianProblem {
    x: Vec<f64>,
    y: Vec<f64>,
    p: OVector<f64, U4>,
}

impl LeastSquaresProblem<f64, Dyn, U4> for GaussianProblem {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U4>;
    type ParameterStorage = Owned<f64, U4>;

    fn set_params(&mut self, p: &OVector<f64, U4>) {
        self.p = *p;
    }

    fn params(&self) -> OVector<f64, U4> {
        self.p
    }

    fn residuals(&self) -> Option<OVector<f64, Dyn>> {
        Some(OVector::<f64, Dyn>::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.y.iter())
                .map(|(&x, &y)| gaussian_func(x, self.p[0], self.p[1], self.p[2], self.p[3]) - y),
        ))
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U4>> {
        Some(OMatrix::<f64, Dyn, U4>::from_fn(self.x.len(), |i, j| {
            let x = self.x[i];
            let mut plus = self.p;
            let mut minus = self.p;
            plus[j] += JAC_EPS;
            minus[j] -= JAC_EPS;
            let f_plus = gaussian_func(x, plus[0], plus[1], plus[2], plus[3]);
            let f_minus = gaussian_func(x, minus[0], minus[1], minus[2], minus[3]);
            (f_plus - f_minus) / (2.0 * JAC_EPS)
        }))
    }
}

struct FanoProblem {
    x: Vec<f64>,
    y: Vec<f64>,
    p: OVector<f64, U5>,
}

impl LeastSquaresProblem<f64, Dyn, U5> for FanoProblem {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U5>;
    type ParameterStorage = Owned<f64, U5>;

    fn set_params(&mut self, p: &OVector<f64, U5>) {
        self.p = *p;
    }

    fn params(&self) -> OVector<f64, U5> {
        self.p
    }

    fn residuals(&self) -> Option<OVector<f64, Dyn>> {
        Some(OVector::<f64, Dyn>::from_iterator(
            self.x.len(),
            self.x.iter().zip(self.y.iter()).map(|(&x, &y)| {
                fano_func(x, self.p[0], self.p[1], self.p[2], self.p[3], self.p[4]) - y
            }),
        ))
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U5>> {
        Some(OMatrix::<f64, Dyn, U5>::from_fn(self.x.len(), |i, j| {
            let x = self.x[i];
            let mut plus = self.p;
            let mut minus = self.p;
            plus[j] += JAC_EPS;
            minus[j] -= JAC_EPS;
            let f_plus = fano_func(x, plus[0], plus[1], plus[2], plus[3], plus[4]);
            let f_minus = fano_func(x, minus[0], minus[1], minus[2], minus[3], minus[4]);
            (f_plus - f_minus) / (2.0 * JAC_EPS)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_intensity_returns_the_brightest_column() {
        let row = vec![1.0, 2.0, 9.0, 3.0, 1.0];
        let out = max_intensity(&row);
        assert_eq!(out["max_intensity"], 2.0);
    }

    #[test]
    fn rmse_of_identical_data_is_zero() {
        let row = vec![1.0, 2.0, 3.0];
        assert_eq!(rmse(&row, &row), 0.0);
    }

    #[test]
    fn gaussian_recovers_known_parameters_on_synthetic_peak() {
        let xdata: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let data: Vec<f64> = xdata.iter().map(|&x| gaussian_func(x, 100.0, 25.0, 4.0, 2.0)).collect();
        let fit = gaussian(&data).expect("fit should converge on a clean synthetic peak");
        assert!((fit["mu"] - 25.0).abs() < 0.5);
        assert!((fit["amplitude"] - 100.0).abs() < 2.0);
    }

    #[test]
    fn centre_ignores_pixels_below_threshold() {
        let mut row = vec![0.0; 20];
        row[10] = 100.0;
        let out = centre(&row);
        assert!((out["centre"] - 11.0).abs() < 1e-6);
    }
}
