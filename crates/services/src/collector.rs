use crate::error::ServiceError;
use phorest_config::Config;
use phorest_core::manifest_entry::ManifestEntry;
use phorest_drivers::{apply_transform, CameraDriver, ThermocoupleDriver};
use phorest_manifest::{FileLock, ManifestStore};
use phorest_runtime::{CycleOutcome, Paths};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// `IDLE -> WAITING_TO_RUN -> COLLECTING -> {IDLE | FATAL_ERROR}`, run once
/// per call to [`CollectorService::cycle`]. The harness supplies the
/// `IDLE`/`WAITING_TO_RUN` cadence; everything here is `COLLECTING`.
pub struct CollectorService {
    config: Config,
    paths: Paths,
    manifest: ManifestStore,
    camera: Box<dyn CameraDriver>,
    thermocouple: Option<Box<dyn ThermocoupleDriver>>,
    failure_count: u32,
}

impl CollectorService {
    pub fn new(
        config: Config,
        paths: Paths,
        camera: Box<dyn CameraDriver>,
        thermocouple: Option<Box<dyn ThermocoupleDriver>>,
    ) -> Result<Self, ServiceError> {
        let manifest = ManifestStore::new(&paths.manifest_path);
        let service = CollectorService { config, paths, manifest, camera, thermocouple, failure_count: 0 };
        service.snapshot_startup_state()?;
        Ok(service)
    }

    /// Copies the config TOML and ROI manifest JSON into the data
    /// directory, under lock, so a running experiment stays reproducible
    /// even if the live config file is edited later.
    fn snapshot_startup_state(&self) -> Result<(), ServiceError> {
        let config_source = self.paths.root_dir.join("configs").join("Phorest_config.toml");
        self.snapshot_one(&config_source, &self.paths.data_dir.join("Phorest_config.snapshot.toml"))?;
        self.snapshot_one(&self.paths.roi_manifest_path, &self.paths.data_dir.join("roi_manifest.snapshot.json"))?;
        Ok(())
    }

    fn snapshot_one(&self, source: &Path, dest: &Path) -> Result<(), ServiceError> {
        if !source.exists() {
            warn!(source = %source.display(), "snapshot source missing, skipping");
            return Ok(());
        }
        let _lock = FileLock::acquire(source)?;
        std::fs::copy(source, dest)?;
        Ok(())
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        let frame = match self.acquire_with_retries().await {
            Ok(frame) => frame,
            Err(reason) => return CycleOutcome::Fatal(reason),
        };

        let temperature_data = if let Some(thermocouple) = &self.thermocouple {
            match thermocouple.read_temperatures().await {
                Ok(reading) => Some(reading),
                Err(e) => {
                    warn!(error = %e, "thermocouple read failed, recording error flag and continuing");
                    Some(phorest_core::manifest_entry::TemperatureData {
                        timestamp_iso: chrono::Utc::now(),
                        data: std::collections::HashMap::new(),
                        error_flag: true,
                        error_message: Some(e.to_string()),
                    })
                }
            }
        } else {
            None
        };

        let entry = ManifestEntry::new(frame.timestamp_iso, Some(frame.camera_data), temperature_data);
        if let Err(e) = self.manifest.add_entry(entry) {
            warn!(error = %e, "failed to append manifest entry");
            return CycleOutcome::Continue;
        }

        if let Err(e) = self.ring_buffer_cleanup() {
            warn!(error = %e, "ring buffer cleanup failed");
        }

        if let Err(e) = phorest_runtime::flag::touch(&self.paths.data_ready_flag) {
            warn!(error = %e, "failed to touch data_ready flag");
        }

        CycleOutcome::Continue
    }

    /// Retries camera acquisition with `COLLECTOR_RETRY_DELAY` between
    /// attempts up to `COLLECTOR_FAILURE_LIMIT`, at which point the
    /// service must exit the process (spec §4.4's FATAL_ERROR state).
    async fn acquire_with_retries(&mut self) -> Result<AcquiredFrame, String> {
        loop {
            match self.camera.acquire_frame(&self.paths.continuous_capture_dir, self.config.camera.camera_id).await {
                Ok((frame, mut camera_data)) => {
                    self.failure_count = 0;
                    let transformed = apply_transform(frame.image, self.config.camera.camera_transform);
                    if let Err(e) = transformed.save(&frame.path) {
                        warn!(error = %e, "failed to persist transformed frame");
                    }
                    camera_data.filepath = frame.path.to_string_lossy().to_string();
                    return Ok(AcquiredFrame { timestamp_iso: camera_data.timestamp_iso, camera_data });
                }
                Err(e) => {
                    self.failure_count += 1;
                    warn!(error = %e, failure_count = self.failure_count, "camera acquisition failed");
                    if self.failure_count >= self.config.retries.collector_failure_limit {
                        return Err(format!("camera failure limit ({}) reached: {e}", self.config.retries.collector_failure_limit));
                    }
                    tokio::time::sleep(Duration::from_secs(self.config.timing.collector_retry_delay)).await;
                }
            }
        }
    }

    /// Evicts the oldest captured images once the buffer exceeds
    /// `IMAGE_BUFFER_SIZE`, ordered by manifest insertion order (not file
    /// mtime — two captures in the same cadence tick can share a
    /// timestamp, but never an index). When the Syncer is enabled, only
    /// evicts entries already marked `image_synced`; unsynced candidates
    /// are left in place with a warning rather than deleted.
    fn ring_buffer_cleanup(&self) -> Result<(), ServiceError> {
        let entries = self.manifest.load()?;
        let present: Vec<(usize, &str, bool)> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let cam = e.camera_data.as_ref()?;
                let path = self.paths.continuous_capture_dir.join(&cam.filename);
                path.exists().then_some((i, cam.filename.as_str(), e.image_synced))
            })
            .collect();

        let limit = self.config.buffer.image_buffer_size as usize;
        let excess = present.len().saturating_sub(limit);
        if excess == 0 {
            return Ok(());
        }

        for &(index, filename, synced) in &present[..excess] {
            let path = self.paths.continuous_capture_dir.join(filename);
            if self.config.services.enable_remote_sync && !synced {
                warn!(index, filename, "ring buffer candidate not yet synced, skipping eviction");
                continue;
            }
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(index, path = %path.display(), error = %e, "failed to evict ring buffer entry");
            }
        }
        Ok(())
    }
}

struct AcquiredFrame {
    timestamp_iso: chrono::DateTime<chrono::Utc>,
    camera_data: phorest_core::manifest_entry::CameraData,
}
