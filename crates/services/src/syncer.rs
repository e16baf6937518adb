use crate::error::ServiceError;
use phorest_core::manifest_entry::ProcessingStatus;
use phorest_manifest::{FileLock, ManifestStore, ManifestUpdate, UpdateValue};
use phorest_runtime::{CycleOutcome, Paths};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cadence `SYNC_INTERVAL`. Three ordered tasks every cycle: archives are
/// *moved* (freeing local disk once backed up remotely), live state is
/// *copied* (keeping it authoritative locally), and processed images are
/// moved last so a crash mid-sync never makes the ring buffer (§4.4)
/// discard data that was never actually copied off-device.
pub struct SyncerService {
    paths: Paths,
    manifest: ManifestStore,
}

impl SyncerService {
    pub fn new(_config: phorest_config::Config, paths: Paths) -> Self {
        let manifest = ManifestStore::new(&paths.manifest_path);
        SyncerService { paths, manifest }
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        if let Err(e) = self.sync_archives() {
            warn!(error = %e, "syncing archives failed");
        }
        if let Err(e) = self.sync_live_state() {
            warn!(error = %e, "syncing live results/manifest failed");
        }
        if let Err(e) = self.sync_processed_images() {
            warn!(error = %e, "syncing processed images failed");
        }
        CycleOutcome::Continue
    }

    fn sync_archives(&self) -> Result<(), ServiceError> {
        if !self.paths.backup_dir.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.paths.remote_backup_dir)?;
        for path in walk_regular_files(&self.paths.backup_dir)? {
            let relative = path.strip_prefix(&self.paths.backup_dir).unwrap_or(&path);
            let dest = self.paths.remote_backup_dir.join(relative);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if let Err(e) = std::fs::rename(&path, &dest) {
                warn!(path = %path.display(), error = %e, "failed to move archive to remote");
            }
        }
        Ok(())
    }

    fn sync_live_state(&self) -> Result<(), ServiceError> {
        if self.paths.results_dir.exists() {
            std::fs::create_dir_all(&self.paths.remote_results_dir)?;
            for path in walk_regular_files(&self.paths.results_dir)? {
                let ext = path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default();
                if ext == "lock" || ext == "tmp" {
                    continue;
                }
                let relative = path.strip_prefix(&self.paths.results_dir).unwrap_or(&path);
                let dest = self.paths.remote_results_dir.join(relative);
                let _lock = FileLock::acquire(&path)?;
                std::fs::copy(&path, &dest)?;
            }
        }

        if self.paths.manifest_path.exists() {
            std::fs::create_dir_all(&self.paths.remote_root_dir.join("data"))?;
            let dest = self.paths.remote_root_dir.join("data").join("metadata_manifest.json");
            let _lock = FileLock::acquire(&self.paths.manifest_path)?;
            std::fs::copy(&self.paths.manifest_path, &dest)?;
        }
        Ok(())
    }

    fn sync_processed_images(&self) -> Result<(), ServiceError> {
        let entries = self.manifest.load()?;
        let candidates: Vec<(usize, PathBuf, String)> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                if e.processing_status != ProcessingStatus::Processed || e.image_synced {
                    return None;
                }
                let filename = e.current_filename()?;
                let path = self.paths.continuous_capture_dir.join(filename);
                path.exists().then_some((i, path, filename.to_string()))
            })
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.paths.remote_data_dir)?;
        let mut synced_indices = Vec::new();
        let mut new_filepaths = Vec::new();
        for (index, path, filename) in candidates {
            let dest = self.paths.remote_data_dir.join(&filename);
            match std::fs::rename(&path, &dest) {
                Ok(()) => {
                    synced_indices.push(index);
                    new_filepaths.push(Some(dest.to_string_lossy().to_string()));
                }
                Err(e) => {
                    warn!(index, path = %path.display(), error = %e, "failed to move processed image to remote, will retry next cycle");
                }
            }
        }
        if synced_indices.is_empty() {
            return Ok(());
        }

        let update = ManifestUpdate {
            image_synced: Some(UpdateValue::Scalar(true)),
            new_filepath: Some(UpdateValue::PerIndex(new_filepaths)),
            ..Default::default()
        };
        self.manifest.update(&synced_indices, &update)?;
        Ok(())
    }
}

fn walk_regular_files(root: &Path) -> Result<Vec<PathBuf>, ServiceError> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    Ok(out)
}
