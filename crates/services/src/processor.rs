use crate::error::ServiceError;
use phorest_analysis::kernel::KernelConfig;
use phorest_analysis::{process_image, AnalysisMethod as KernelAnalysisMethod};
use phorest_config::{AnalysisMethod as ConfigAnalysisMethod, Config};
use phorest_core::manifest_entry::ProcessingStatus;
use phorest_core::result::ResultRecord;
use phorest_core::roi::RoiTable;
use phorest_manifest::atomic::load_json_or_recover;
use phorest_manifest::{FileLock, ManifestStore, ManifestUpdate, ResultsLog, UpdateValue};
use phorest_runtime::{CycleOutcome, Paths};
use tracing::warn;

fn kernel_method(method: ConfigAnalysisMethod) -> KernelAnalysisMethod {
    match method {
        ConfigAnalysisMethod::MaxIntensity => KernelAnalysisMethod::MaxIntensity,
        ConfigAnalysisMethod::Centre => KernelAnalysisMethod::Centre,
        ConfigAnalysisMethod::Gaussian => KernelAnalysisMethod::Gaussian,
        ConfigAnalysisMethod::Fano => KernelAnalysisMethod::Fano,
    }
}

/// `IDLE -> WAITING_FOR_DATA -> PROCESSING -> IDLE`, triggered by the
/// `data_ready` flag (consumed by unlink before any work starts).
pub struct ProcessorService {
    config: Config,
    paths: Paths,
    manifest: ManifestStore,
    results_log: ResultsLog,
}

impl ProcessorService {
    pub fn new(config: Config, paths: Paths) -> Self {
        let manifest = ManifestStore::new(&paths.manifest_path);
        let results_log = ResultsLog::new(&paths.results_log_path);
        ProcessorService { config, paths, manifest, results_log }
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        match phorest_runtime::flag::consume(&self.paths.data_ready_flag) {
            Ok(true) => {}
            Ok(false) => return CycleOutcome::Continue,
            Err(e) => {
                warn!(error = %e, "failed to consume data_ready flag");
                return CycleOutcome::Continue;
            }
        }

        if let Err(e) = self.process_pending() {
            warn!(error = %e, "processing cycle failed");
        }

        CycleOutcome::Continue
    }

    fn process_pending(&self) -> Result<(), ServiceError> {
        let entries = self.manifest.load()?;
        let pending: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.processing_status == ProcessingStatus::Pending)
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let roi_table: RoiTable = {
            let _lock = FileLock::acquire(&self.paths.roi_manifest_path)?;
            load_json_or_recover(&self.paths.roi_manifest_path)?
        };

        let kernel_config = KernelConfig {
            method: kernel_method(self.config.data_analysis.method),
            number_of_sub_rois: self.config.data_analysis.number_of_sub_rois,
            debug_mode: self.config.development.debug_mode,
        };

        let mut statuses = Vec::with_capacity(pending.len());
        let mut timestamps = Vec::with_capacity(pending.len());
        let mut proc_errors = Vec::with_capacity(pending.len());
        let mut proc_msgs = Vec::with_capacity(pending.len());
        let mut records: Vec<Option<ResultRecord>> = Vec::with_capacity(pending.len());

        for &index in &pending {
            let entry = &entries[index];
            let now = chrono::Utc::now();
            let Some(filename) = entry.current_filename() else {
                statuses.push(ProcessingStatus::Failed);
                timestamps.push(now);
                proc_errors.push(true);
                proc_msgs.push(Some("entry has no camera_data".to_string()));
                records.push(None);
                continue;
            };
            let image_path = self.paths.continuous_capture_dir.join(filename);

            match process_image(&image_path, &roi_table, &kernel_config) {
                Ok(analysis) => {
                    let record = ResultRecord {
                        entry: entry.clone(),
                        image_analysis: Some(analysis),
                        temperature_readings: entry.temperature_data.as_ref().map(|t| t.data.clone()),
                    };
                    statuses.push(ProcessingStatus::Processed);
                    timestamps.push(now);
                    proc_errors.push(false);
                    proc_msgs.push(None);
                    records.push(Some(record));
                }
                Err(e) => {
                    statuses.push(ProcessingStatus::Failed);
                    timestamps.push(now);
                    proc_errors.push(true);
                    proc_msgs.push(Some(e.to_string()));
                    records.push(None);
                }
            }
        }

        // Manifest-first: the batched status update commits before any
        // results-log append. A crash after this point but before an
        // entry's append can lose that one result, but a restart will
        // never see the entry as `pending` again, so it can never be
        // appended twice (spec.md §9 scenario 6 / SPEC_FULL.md §16.1).
        let update = ManifestUpdate {
            processing_status: Some(UpdateValue::PerIndex(statuses)),
            processing_timestamp_iso: Some(UpdateValue::PerIndex(timestamps)),
            processing_error: Some(UpdateValue::PerIndex(proc_errors)),
            processing_error_msg: Some(UpdateValue::PerIndex(proc_msgs)),
            ..Default::default()
        };
        self.manifest.update(&pending, &update)?;

        for (&index, record) in pending.iter().zip(records.into_iter()) {
            let Some(record) = record else { continue };
            if !self.still_processed(index)? {
                warn!(index, "entry no longer processed after manifest update, skipping append");
                continue;
            }
            if let Err(e) = self.results_log.append(&record) {
                warn!(index, error = %e, "failed to append result record");
            }
        }

        if let Err(e) = phorest_runtime::flag::touch(&self.paths.results_ready_flag) {
            warn!(error = %e, "failed to touch results_ready flag");
        }
        Ok(())
    }

    /// Re-confirms `index` still reads `processed` immediately before the
    /// results-log append. The manifest update above already committed, so
    /// this guards only against the entry having been rotated or
    /// overwritten out from under this cycle between the two steps.
    fn still_processed(&self, index: usize) -> Result<bool, ServiceError> {
        let entries = self.manifest.load()?;
        Ok(entries.get(index).map(|e| e.processing_status == ProcessingStatus::Processed).unwrap_or(false))
    }
}
