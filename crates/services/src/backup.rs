use crate::error::ServiceError;
use flate2::write::GzEncoder;
use flate2::Compression;
use phorest_manifest::FileLock;
use phorest_runtime::{CycleOutcome, Paths};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cadence `FILE_BACKUP_INTERVAL`. Two phases, run every cycle: archive
/// the fixed live-file list (a single `rename(2)` per file, under that
/// file's own lock, so readers/writers only ever see the original file or
/// no file), then gzip everything in the backup tree that isn't already
/// `.gz`.
pub struct BackupService {
    paths: Paths,
}

impl BackupService {
    pub fn new(_config: phorest_config::Config, paths: Paths) -> Self {
        BackupService { paths }
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        if let Err(e) = self.archive() {
            warn!(error = %e, "backup archive phase failed");
        }
        if let Err(e) = self.compress_backup_tree() {
            warn!(error = %e, "backup compress phase failed");
        }
        CycleOutcome::Continue
    }

    fn archive_sources(&self) -> Vec<PathBuf> {
        vec![
            self.paths.data_dir.join("Phorest_config.snapshot.toml"),
            self.paths.roi_manifest_path.clone(),
            self.paths.manifest_path.clone(),
            self.paths.results_log_path.clone(),
            self.paths.csv_path.clone(),
            self.paths.plot_path.clone(),
        ]
    }

    fn archive(&self) -> Result<(), ServiceError> {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        for source in self.archive_sources() {
            if !source.exists() {
                warn!(source = %source.display(), "backup source missing, skipping");
                continue;
            }
            let parent_name = source.parent().and_then(|p| p.file_name()).map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            let stem = source.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
            let suffix = source.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
            let dest_dir = self.paths.backup_dir.join(&parent_name);
            std::fs::create_dir_all(&dest_dir)?;
            let dest = dest_dir.join(format!("{stem}_{timestamp}{suffix}"));

            let _lock = FileLock::acquire(&source)?;
            std::fs::rename(&source, &dest)?;
        }
        Ok(())
    }

    fn compress_backup_tree(&self) -> Result<(), ServiceError> {
        if !self.paths.backup_dir.exists() {
            return Ok(());
        }
        for entry in walk_files(&self.paths.backup_dir)? {
            if entry.extension().map(|e| e == "gz").unwrap_or(false) {
                continue;
            }
            let gz_path = entry.with_extension(format!(
                "{}.gz",
                entry.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default()
            ));
            {
                let input = std::fs::File::open(&entry)?;
                let output = std::fs::File::create(&gz_path)?;
                let mut encoder = GzEncoder::new(output, Compression::default());
                let mut reader = io::BufReader::new(input);
                io::copy(&mut reader, &mut encoder)?;
                encoder.finish()?;
            }
            std::fs::remove_file(&entry)?;
        }
        Ok(())
    }
}

fn walk_files(root: &Path) -> Result<Vec<PathBuf>, ServiceError> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().map(|e| e != "lock").unwrap_or(true) {
                out.push(path);
            }
        }
    }
    Ok(out)
}
