use crate::chipmap::{ChipMapDatabase, UserChipMapping};
use crate::error::RoiError;
use crate::geometry::{angle_between_points, calculate_distance, median, rotate_point};
use crate::matching::{match_template_quality, preprocess_search_window, QUALITY_THRESHOLD};
use image::{GenericImageView, GrayImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use phorest_core::roi::{RoiEntry, RoiHalf, RoiTable};
use std::path::Path;
use tracing::warn;

/// One pass's accumulated registration state: rotation (degrees,
/// accumulated across passes) and scale (always freshly computed, never
/// accumulated — only rotation compounds between the user-click pass and
/// the refinement passes).
struct Transform {
    rotation_deg: f64,
    scale: f64,
}

fn pairwise_rotation_and_scale(
    locations: &[[f64; 2]],
    chip_locations: &[[f64; 2]],
) -> Result<(f64, f64), RoiError> {
    let mut rotation_diffs = Vec::new();
    let mut scale_factors = Vec::new();
    for i in 0..locations.len() {
        for j in (i + 1)..locations.len() {
            let angle = angle_between_points(locations[i], locations[j]);
            let chip_angle = angle_between_points(chip_locations[i], chip_locations[j]);
            rotation_diffs.push(chip_angle - angle);

            let dist = calculate_distance(locations[i], locations[j]);
            let chip_dist = calculate_distance(chip_locations[i], chip_locations[j]);
            if chip_dist == 0.0 {
                return Err(RoiError::ZeroChipDistance);
            }
            scale_factors.push(dist / chip_dist);
        }
    }
    Ok((median(&rotation_diffs), median(&scale_factors)))
}

/// One landmark refined by template matching against a rotated/scaled
/// search window. `None` means the quality gate rejected it.
struct Refined {
    label: String,
    chip_location: [f64; 2],
    pixel_location: Option<[f64; 2]>,
}

fn refine_pass(
    image: &GrayImage,
    chip_type: &str,
    features: &[(String, [f64; 2], [f64; 2])], // (label, user_location, chip_location)
    transform: &Transform,
    template_dir: &Path,
) -> Result<Vec<Refined>, RoiError> {
    let (w, h) = image.dimensions();
    let centre = [w as f64 / 2.0, h as f64 / 2.0];
    let mut out = Vec::with_capacity(features.len());

    for (label, user_location, chip_location) in features {
        let rotated_location = rotate_point(*user_location, centre, transform.rotation_deg);

        let template_path = template_dir.join(&chip_type[..chip_type.len().saturating_sub(2)]).join(chip_type).join(format!("{label}.png"));
        let raw_template = image::open(&template_path).map_err(RoiError::TemplateDecode)?.to_luma8();
        let new_w = ((raw_template.width() as f64) * transform.scale).round().max(1.0) as u32;
        let new_h = ((raw_template.height() as f64) * transform.scale).round().max(1.0) as u32;
        let template = image::imageops::resize(&raw_template, new_w, new_h, image::imageops::FilterType::Triangle);

        let window_w = template.width() as f64 * 1.5;
        let window_h = template.height() as f64 * 1.5;
        let x_start = (rotated_location[0] - window_w / 2.0).max(0.0) as u32;
        let y_start = (rotated_location[1] - window_h / 2.0).max(0.0) as u32;
        let x_end = ((rotated_location[0] + window_w / 2.0) as u32).min(w);
        let y_end = ((rotated_location[1] + window_h / 2.0) as u32).min(h);

        if x_end <= x_start || y_end <= y_start {
            warn!(label, "search window collapsed to empty, skipping landmark");
            out.push(Refined { label: label.clone(), chip_location: *chip_location, pixel_location: None });
            continue;
        }

        let window = image::imageops::crop_imm(image, x_start, y_start, x_end - x_start, y_end - y_start).to_image();
        let preprocessed = preprocess_search_window(&window);
        let result = match_template_quality(&preprocessed, &template);

        if result.quality > QUALITY_THRESHOLD {
            let px = [
                (x_start + result.location.0) as f64,
                (y_start + result.location.1) as f64,
            ];
            out.push(Refined { label: label.clone(), chip_location: *chip_location, pixel_location: Some(px) });
        } else {
            warn!(label, quality = result.quality, "landmark failed to locate, quality below threshold");
            out.push(Refined { label: label.clone(), chip_location: *chip_location, pixel_location: None });
        }
    }

    Ok(out)
}

/// Full two-pass registration: user-clicked landmarks + chip map ->
/// per-grating ROI table. See `SPEC_FULL.md` section 8 for the algorithm
/// this mirrors step for step.
pub fn generate_roi_table(
    image: &GrayImage,
    chip_db: &ChipMapDatabase,
    user_mapping: &UserChipMapping,
    template_dir: &Path,
) -> Result<RoiTable, RoiError> {
    let chip_mapping = chip_db.find(&user_mapping.chip_type).ok_or_else(|| RoiError::UnknownChipType(user_mapping.chip_type.clone()))?;

    let mut resolved = Vec::new();
    for f in &user_mapping.features {
        let chip_location = chip_mapping.label_origin(&f.label).ok_or_else(|| RoiError::UnknownLabel(f.label.clone()))?;
        resolved.push((f.label.clone(), f.user_location, chip_location));
    }
    if resolved.len() < 2 {
        return Err(RoiError::TooFewLandmarks(resolved.len()));
    }

    let locations: Vec<[f64; 2]> = resolved.iter().map(|(_, l, _)| *l).collect();
    let chip_locations: Vec<[f64; 2]> = resolved.iter().map(|(_, _, c)| *c).collect();
    let (initial_rotation, initial_scale) = pairwise_rotation_and_scale(&locations, &chip_locations)?;

    let rotated_once = rotate_about_center(image, (-initial_rotation).to_radians(), Interpolation::Bilinear, image::Luma([0u8]));
    let pass1 = refine_pass(
        &rotated_once,
        &user_mapping.chip_type,
        &resolved,
        &Transform { rotation_deg: initial_rotation, scale: initial_scale },
        template_dir,
    )?;

    let pass1_good: Vec<&Refined> = pass1.iter().filter(|r| r.pixel_location.is_some()).collect();
    if pass1_good.len() < 2 {
        return Err(RoiError::NoLandmarksRegistered);
    }
    let pass1_locations: Vec<[f64; 2]> = pass1_good.iter().map(|r| r.pixel_location.unwrap()).collect();
    let pass1_chip_locations: Vec<[f64; 2]> = pass1_good.iter().map(|r| r.chip_location).collect();
    let (rotation_delta, refined_scale) = pairwise_rotation_and_scale(&pass1_locations, &pass1_chip_locations)?;
    let accumulated_rotation = initial_rotation + rotation_delta;

    let rotated_twice = rotate_about_center(image, (-accumulated_rotation).to_radians(), Interpolation::Bilinear, image::Luma([0u8]));
    let pass2 = refine_pass(
        &rotated_twice,
        &user_mapping.chip_type,
        &resolved,
        &Transform { rotation_deg: accumulated_rotation, scale: refined_scale },
        template_dir,
    )?;

    let pass2_good: Vec<&Refined> = pass2.iter().filter(|r| r.pixel_location.is_some()).collect();
    if pass2_good.len() < 2 {
        return Err(RoiError::NoLandmarksRegistered);
    }

    let mut x_offsets = Vec::new();
    let mut y_offsets = Vec::new();
    for r in &pass2_good {
        let px = r.pixel_location.unwrap();
        x_offsets.push(px[0] - r.chip_location[0] * refined_scale);
        y_offsets.push(px[1] - r.chip_location[1] * refined_scale);
    }
    let offset = [median(&x_offsets), median(&y_offsets)];

    let mut table = RoiTable { image_angle: accumulated_rotation, rois: Default::default() };
    let (img_w, img_h) = rotated_twice.dimensions();

    for grating in &chip_mapping.gratings {
        let origin_x = (grating.grating_origin[0] * refined_scale + offset[0]).round();
        let origin_y = (grating.grating_origin[1] * refined_scale + offset[1]).round();
        let width = (grating.x_size * refined_scale).round();
        let height = (grating.y_size * refined_scale).round();

        let (half_a, half_b, a_is_x_split) = if chip_mapping.splits_north_south() {
            (RoiHalf::North, RoiHalf::South, false)
        } else {
            (RoiHalf::East, RoiHalf::West, true)
        };

        let (a_entry, b_entry) = if a_is_x_split {
            let half_w = (width / 2.0).round();
            (
                RoiEntry { label: grating.label.clone(), flip: half_a.flip(), coords: [origin_y as i64, origin_x as i64], size: [height as i64, half_w as i64] },
                RoiEntry { label: grating.label.clone(), flip: half_b.flip(), coords: [origin_y as i64, (origin_x + half_w) as i64], size: [height as i64, (width - half_w) as i64] },
            )
        } else {
            let half_h = (height / 2.0).round();
            (
                RoiEntry { label: grating.label.clone(), flip: half_a.flip(), coords: [origin_y as i64, origin_x as i64], size: [half_h as i64, width as i64] },
                RoiEntry { label: grating.label.clone(), flip: half_b.flip(), coords: [(origin_y + half_h) as i64, origin_x as i64], size: [(height - half_h) as i64, width as i64] },
            )
        };

        for (half, entry) in [(half_a, a_entry), (half_b, b_entry)] {
            if within_bounds(&entry, img_w, img_h) {
                table.insert(&grating.label, half, entry);
            } else {
                warn!(label = grating.label, "ROI falls outside image bounds, dropping");
            }
        }
    }

    Ok(table)
}

fn within_bounds(entry: &RoiEntry, img_w: u32, img_h: u32) -> bool {
    let [y, x] = entry.coords;
    let [h, w] = entry.size;
    y >= 0 && x >= 0 && h > 0 && w > 0 && (x + w) as u32 <= img_w && (y + h) as u32 <= img_h
}
