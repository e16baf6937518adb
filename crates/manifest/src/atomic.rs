use crate::error::ManifestError;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes `value` to `path` atomically: serialize to `<path>.tmp`, then
/// `rename` over `path`. The caller must already hold the path's lock.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
    }
    let tmp_path = tmp_path(path);
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|source| ManifestError::Serialize { path: path.to_path_buf(), source })?;
    fs::write(&tmp_path, &bytes).map_err(|source| ManifestError::Io { path: tmp_path.clone(), source })?;
    fs::rename(&tmp_path, path).map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Loads and parses `path` as JSON. A missing file yields `T::default()`
/// (this is the normal "first run" case, not an error). A file that exists
/// but fails to parse is renamed aside to `<stem>.corrupt_<ts><suffix>` and
/// `T::default()` is returned so the caller can continue with empty state —
/// this is the one recovery path the manifest, results log, and status file
/// all share. The caller must already hold the path's lock.
pub fn load_json_or_recover<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ManifestError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = fs::read(path).map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Ok(value),
        Err(e) => {
            let corrupt_path = corrupt_path(path);
            warn!(
                path = %path.display(),
                corrupt_path = %corrupt_path.display(),
                error = %e,
                "corrupt JSON, renaming aside and continuing with empty state"
            );
            fs::rename(path, &corrupt_path).map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
            Ok(T::default())
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    })
}

fn corrupt_path(path: &Path) -> PathBuf {
    let ts = Utc::now().format("%Y%m%d_%H%M%S");
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.corrupt_{ts}{suffix}"))
}
