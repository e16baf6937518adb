use crate::error::AnalysisError;
use crate::postprocess::{analyse_roi_data, quantile, AnalysisMethod};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use phorest_core::result::ImageAnalysisRecord;
use phorest_core::roi::RoiTable;
use std::path::Path;

/// A capture below this many bytes is treated as a corrupt/empty write
/// rather than handed to the decoder.
const MIN_IMAGE_BYTES: u64 = 256;

pub struct KernelConfig {
    pub method: AnalysisMethod,
    pub number_of_sub_rois: u32,
    pub debug_mode: bool,
}

/// `image + ROI table -> per-ROI fit statistics`, the Analysis Kernel's
/// single entry point. Every step is a contract from the original
/// pipeline's `analysis_functions.py`, ported in order: reject bad input,
/// prelude brightness/contrast, normalize, rotate, then per-ROI
/// extract/reduce/fit/postprocess.
pub fn process_image(
    image_path: &Path,
    roi_table: &RoiTable,
    config: &KernelConfig,
) -> Result<ImageAnalysisRecord, AnalysisError> {
    let metadata = std::fs::metadata(image_path).map_err(|_| AnalysisError::MissingFile(image_path.to_path_buf()))?;
    if metadata.len() < MIN_IMAGE_BYTES {
        return Err(AnalysisError::TooSmall { path: image_path.to_path_buf(), size: metadata.len() });
    }

    let decoded = image::open(image_path)
        .map_err(|source| AnalysisError::Decode { path: image_path.to_path_buf(), source })?;
    let gray = decoded.to_luma8();

    let pixels: Vec<f64> = gray.pixels().map(|p| p.0[0] as f64).collect();
    let brightness = pixels.iter().sum::<f64>() / pixels.len() as f64;
    let contrast = quantile(&pixels, 0.95) - quantile(&pixels, 0.05);

    let normalized = normalize_min_max(&gray);
    let rotated = rotate_about_center(&normalized, (-roi_table.image_angle).to_radians(), Interpolation::Bilinear, Luma([0u8]));

    let mut rois = Vec::new();
    for (key, entry) in roi_table.iter() {
        let [y, x] = entry.coords;
        let [h, w] = entry.size;
        if y < 0 || x < 0 || h <= 0 || w <= 0 {
            return Err(AnalysisError::RoiOutOfBounds(key.clone()));
        }
        let (y, x, h, w) = (y as u32, x as u32, h as u32, w as u32);
        if x + w > rotated.width() || y + h > rotated.height() {
            return Err(AnalysisError::RoiOutOfBounds(key.clone()));
        }

        let mut sub = image::imageops::crop_imm(&rotated, x, y, w, h).to_image();
        if entry.flip {
            image::imageops::flip_horizontal_in_place(&mut sub);
        }

        let reduced = if config.number_of_sub_rois == 0 {
            sub
        } else {
            image::imageops::resize(&sub, w, config.number_of_sub_rois, image::imageops::FilterType::Triangle)
        };

        let rows: Vec<Vec<f64>> = (0..reduced.height())
            .map(|row| (0..reduced.width()).map(|col| reduced.get_pixel(col, row).0[0] as f64).collect())
            .collect();

        rois.push(analyse_roi_data(key, config.method, &rows, config.debug_mode));
    }

    Ok(ImageAnalysisRecord { brightness, contrast, rois })
}

fn normalize_min_max(image: &GrayImage) -> GrayImage {
    let min = image.pixels().map(|p| p.0[0]).min().unwrap_or(0) as f64;
    let max = image.pixels().map(|p| p.0[0]).max().unwrap_or(255) as f64;
    let range = (max - min).max(1.0);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0] as f64;
        Luma([(((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};
    use phorest_core::roi::{RoiEntry, RoiHalf};
    use std::collections::BTreeMap;

    fn write_test_png(path: &Path, width: u32, height: u32) {
        let img = GrayImage::from_fn(width, height, |x, _y| Luma([((x * 3) % 256) as u8]));
        let file = std::fs::File::create(path).unwrap();
        let mut writer = std::io::BufWriter::new(file);
        PngEncoder::new(&mut writer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::L8)
            .unwrap();
    }

    #[test]
    fn missing_file_is_rejected_without_panicking() {
        let config = KernelConfig { method: AnalysisMethod::MaxIntensity, number_of_sub_rois: 0, debug_mode: false };
        let table = RoiTable { image_angle: 0.0, rois: BTreeMap::new() };
        let err = process_image(Path::new("/nonexistent/image.png"), &table, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingFile(_)));
    }

    #[test]
    fn produces_one_fit_record_per_roi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write_test_png(&path, 200, 100);

        let mut table = RoiTable { image_angle: 0.0, rois: BTreeMap::new() };
        table.insert(
            "G1",
            RoiHalf::East,
            RoiEntry { label: "G1".into(), flip: true, coords: [10, 10], size: [20, 50] },
        );

        let config = KernelConfig { method: AnalysisMethod::MaxIntensity, number_of_sub_rois: 0, debug_mode: false };
        let record = process_image(&path, &table, &config).unwrap();
        assert_eq!(record.rois.len(), 1);
    }
}
