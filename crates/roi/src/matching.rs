use image::{GenericImageView, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};

/// Result of locating one template within a search window: the best-match
/// top-left pixel (relative to the window) and its quality metric
/// (peak response / mean response of the whole correlation surface).
pub struct MatchResult {
    pub location: (u32, u32),
    pub quality: f64,
}

/// The quality gate every refined landmark must clear to be trusted.
pub const QUALITY_THRESHOLD: f64 = 1.5;

/// Unsharp-mask then Otsu-binarize a search window so its intensity
/// statistics match the template's (which is itself a clean binary mask).
pub fn preprocess_search_window(window: &GrayImage) -> GrayImage {
    let blurred = gaussian_blur_f32(window, 25.0 / 6.0);
    let sharpened = GrayImage::from_fn(window.width(), window.height(), |x, y| {
        let w = window.get_pixel(x, y).0[0] as f32;
        let b = blurred.get_pixel(x, y).0[0] as f32;
        Luma([((1.5 * w) - (0.5 * b)).round().clamp(0.0, 255.0) as u8])
    });
    let level = otsu_level(&sharpened);
    GrayImage::from_fn(sharpened.width(), sharpened.height(), |x, y| {
        if sharpened.get_pixel(x, y).0[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Normalised cross-correlation template match over a preprocessed window.
pub fn match_template_quality(window: &GrayImage, template: &GrayImage) -> MatchResult {
    let result = match_template(window, template, MatchTemplateMethod::CrossCorrelationNormalized);
    let extremes = find_extremes(&result);
    let mean: f64 = {
        let (w, h) = result.dimensions();
        let sum: f64 = result.pixels().map(|p| p.0[0] as f64).sum();
        sum / (w as f64 * h as f64)
    };
    let quality = if mean > 0.0 { extremes.max_value as f64 / mean } else { 0.0 };
    MatchResult { location: extremes.max_value_location, quality }
}
