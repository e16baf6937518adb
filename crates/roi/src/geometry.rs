/// Angle, in degrees, from `a` to `b` relative to the +x axis.
pub fn angle_between_points(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[1] - a[1]).atan2(b[0] - a[0]).to_degrees()
}

pub fn calculate_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
}

/// Rotates `point` by `angle_deg` about `centre`, standard 2-D rotation
/// matrix convention (positive angle = counter-clockwise in image
/// coordinates, matching the original's `rotate_user_feature_locations`).
pub fn rotate_point(point: [f64; 2], centre: [f64; 2], angle_deg: f64) -> [f64; 2] {
    let angle = angle_deg.to_radians();
    let (sin, cos) = angle.sin_cos();
    let dx = point[0] - centre[0];
    let dy = point[1] - centre[1];
    [centre[0] + dx * cos - dy * sin, centre[1] + dx * sin + dy * cos]
}

/// Median (quantile 0.5, linear interpolation) of a slice of angles/
/// distances — used throughout the registration pipeline for robustness
/// to a single bad landmark.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
