//! `phorest roi generate` — run the two-pass registration pipeline
//! (`phorest_roi::generate_roi_table`) against an operator-supplied
//! reference image and landmark click set, and write the resulting ROI
//! table JSON.

use crate::error::{CliError, CliResult};
use phorest_manifest::atomic::save_json;
use phorest_manifest::FileLock;
use phorest_roi::{generate_roi_table, ChipMapDatabase, UserChipMapping};
use std::path::Path;

pub fn run(
    image_path: &Path,
    chip_db_path: &Path,
    user_mapping_path: &Path,
    template_dir: &Path,
    out_path: &Path,
) -> CliResult<()> {
    let chip_db: ChipMapDatabase = read_json(chip_db_path)?;
    let user_mapping: UserChipMapping = read_json(user_mapping_path)?;
    let image = image::open(image_path)
        .map_err(|source| CliError::ImageDecode { path: image_path.to_path_buf(), source })?
        .to_luma8();

    let table = generate_roi_table(&image, &chip_db, &user_mapping, template_dir)?;

    let _lock = FileLock::acquire(out_path)?;
    save_json(out_path, &table)?;

    println!(
        "wrote {} ROIs (image_angle={:.3}) to {}",
        table.iter().count(),
        table.image_angle,
        out_path.display()
    );
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Json { path: path.to_path_buf(), source })
}
