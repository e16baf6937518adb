use crate::error::ServiceError;
use flate2::write::GzEncoder;
use flate2::Compression;
use phorest_core::manifest_entry::ProcessingStatus;
use phorest_manifest::{ManifestStore, ManifestUpdate, UpdateValue};
use phorest_runtime::{CycleOutcome, Paths};
use std::io;
use tracing::warn;

/// Cadence `COMPRESS_INTERVAL`. A single cycle drains the *whole* current
/// backlog (re-checking the work predicate after each pass) before the
/// harness is allowed to sleep again, rather than compressing one entry
/// per cadence tick.
pub struct CompressorService {
    paths: Paths,
    manifest: ManifestStore,
}

impl CompressorService {
    pub fn new(_config: phorest_config::Config, paths: Paths) -> Self {
        let manifest = ManifestStore::new(&paths.manifest_path);
        CompressorService { paths, manifest }
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        loop {
            match self.drain_one_batch() {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "compressor batch failed");
                    break;
                }
            }
        }
        CycleOutcome::Continue
    }

    fn work_items(&self) -> Result<Vec<(usize, std::path::PathBuf)>, ServiceError> {
        let entries = self.manifest.load()?;
        Ok(entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                if e.processing_status != ProcessingStatus::Processed || e.compression_attempted {
                    return None;
                }
                let filename = e.current_filename()?;
                if filename.ends_with(".gz") {
                    return None;
                }
                let path = self.paths.continuous_capture_dir.join(filename);
                path.exists().then_some((i, path))
            })
            .collect())
    }

    /// Compresses the current batch and applies one manifest update per
    /// call. Returns the number of entries touched so [`cycle`] knows
    /// whether to keep draining.
    fn drain_one_batch(&self) -> Result<usize, ServiceError> {
        let items = self.work_items()?;
        if items.is_empty() {
            return Ok(0);
        }

        let mut indices = Vec::with_capacity(items.len());
        let mut new_filenames = Vec::with_capacity(items.len());
        for (index, path) in &items {
            match gzip_in_place(path) {
                Ok(gz_name) => {
                    indices.push(*index);
                    new_filenames.push(Some(gz_name));
                }
                Err(e) => {
                    warn!(index, path = %path.display(), error = %e, "failed to compress file");
                    indices.push(*index);
                    new_filenames.push(None);
                }
            }
        }

        let update = ManifestUpdate {
            compression_attempted: Some(UpdateValue::Scalar(true)),
            new_filename: Some(UpdateValue::PerIndex(new_filenames)),
            ..Default::default()
        };
        self.manifest.update(&indices, &update)?;
        Ok(indices.len())
    }
}

/// Gzips `path` to `<name>.gz` alongside it and deletes the original,
/// returning the new basename for the manifest update.
fn gzip_in_place(path: &std::path::Path) -> Result<String, ServiceError> {
    let gz_path = path.with_extension(format!(
        "{}.gz",
        path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default()
    ));
    {
        let input = std::fs::File::open(path)?;
        let output = std::fs::File::create(&gz_path)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        let mut reader = io::BufReader::new(input);
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?;
    }
    std::fs::remove_file(path)?;
    Ok(gz_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default())
}
