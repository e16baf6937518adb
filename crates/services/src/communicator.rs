use crate::error::ServiceError;
use phorest_config::Config;
use phorest_core::manifest_entry::ProcessingStatus;
use phorest_core::result::ResultRecord;
use phorest_manifest::{FileLock, ManifestStore, ManifestUpdate, ResultsLog, UpdateValue};
use phorest_runtime::{CycleOutcome, Paths};
use plotters::prelude::*;
use std::collections::BTreeMap;
use tracing::warn;

/// `IDLE -> WAITING_FOR_RESULTS -> COMMUNICATING -> IDLE`, triggered by the
/// `results_ready` flag. The handler always rewrites from the *entire*
/// processed set, not just the newly-un-transmitted subset, so a lost CSV
/// or plot file is repaired on the very next cycle.
pub struct CommunicatorService {
    config: Config,
    paths: Paths,
    manifest: ManifestStore,
    results_log: ResultsLog,
}

impl CommunicatorService {
    pub fn new(config: Config, paths: Paths) -> Self {
        let manifest = ManifestStore::new(&paths.manifest_path);
        let results_log = ResultsLog::new(&paths.results_log_path);
        CommunicatorService { config, paths, manifest, results_log }
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        match phorest_runtime::flag::consume(&self.paths.results_ready_flag) {
            Ok(true) => {}
            Ok(false) => return CycleOutcome::Continue,
            Err(e) => {
                warn!(error = %e, "failed to consume results_ready flag");
                return CycleOutcome::Continue;
            }
        }

        if let Err(e) = self.communicate() {
            warn!(error = %e, "communication cycle failed");
        }
        CycleOutcome::Continue
    }

    fn communicate(&self) -> Result<(), ServiceError> {
        use phorest_config::CommunicationMethod;
        match self.config.communication.method {
            CommunicationMethod::OpcUa => {
                warn!("OPC_UA communication method is reserved and not yet implemented, skipping cycle");
                return Ok(());
            }
            CommunicationMethod::CsvPlot => {}
        }

        let entries = self.manifest.load()?;
        let processed: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.processing_status == ProcessingStatus::Processed)
            .map(|(i, _)| i)
            .collect();
        let untransmitted: Vec<usize> =
            processed.iter().copied().filter(|&i| !entries[i].data_transmitted).collect();
        if untransmitted.is_empty() {
            return Ok(());
        }

        let records = self.results_log.read_all()?;
        let by_timestamp: BTreeMap<_, _> =
            records.iter().map(|r| (r.entry.entry_timestamp_iso, r)).collect();
        let processed_records: Vec<&ResultRecord> = processed
            .iter()
            .filter_map(|&i| by_timestamp.get(&entries[i].entry_timestamp_iso).copied())
            .collect();

        self.write_csv(&processed_records)?;
        self.write_plot(&processed_records)?;

        let update = ManifestUpdate { data_transmitted: Some(UpdateValue::Scalar(true)), ..Default::default() };
        self.manifest.update(&untransmitted, &update)?;
        Ok(())
    }

    fn write_csv(&self, records: &[&ResultRecord]) -> Result<(), ServiceError> {
        let _lock = FileLock::acquire(&self.paths.csv_path)?;
        let tmp_path = self.paths.csv_path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            let mut header = vec!["timestamp".to_string()];
            if let Some(first) = records.first() {
                if let Some(analysis) = &first.image_analysis {
                    header.push("brightness".to_string());
                    header.push("contrast".to_string());
                    for roi in &analysis.rois {
                        for stat_name in roi.stats.keys() {
                            header.push(format!("{}_{}", roi.roi_label, stat_name));
                        }
                    }
                }
                if let Some(temps) = &first.temperature_readings {
                    for sensor in temps.keys() {
                        header.push(format!("temperature_{sensor}"));
                    }
                }
            }
            writer.write_record(&header)?;

            for record in records {
                let mut row = vec![record.entry.entry_timestamp_iso.to_rfc3339()];
                if let Some(analysis) = &record.image_analysis {
                    row.push(analysis.brightness.to_string());
                    row.push(analysis.contrast.to_string());
                    for roi in &analysis.rois {
                        for stat in roi.stats.values() {
                            row.push(stat.mean.to_string());
                        }
                    }
                }
                if let Some(temps) = &record.temperature_readings {
                    for value in temps.values() {
                        row.push(value.to_string());
                    }
                }
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.paths.csv_path)?;
        Ok(())
    }

    fn write_plot(&self, records: &[&ResultRecord]) -> Result<(), ServiceError> {
        let _lock = FileLock::acquire(&self.paths.plot_path)?;
        let width = 1200u32;
        let height = 800u32;
        let root = BitmapBackend::new(&self.paths.plot_path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ServiceError::Plot(e.to_string()))?;
        let (upper, lower) = root.split_vertically(height / 2);

        let times: Vec<f64> = (0..records.len()).map(|i| i as f64).collect();
        let metric_min = 0.0;

        let mut per_roi: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(analysis) = &record.image_analysis {
                for roi in &analysis.rois {
                    if let Some(stat) = roi.stats.values().next() {
                        per_roi.entry(roi.roi_label.clone()).or_default().push((i as f64, stat.mean));
                    }
                }
            }
        }
        let metric_max = per_roi.values().flatten().map(|&(_, v)| v).fold(1.0_f64, f64::max);

        let mut metric_chart = ChartBuilder::on(&upper)
            .caption("ROI metric over time", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(0.0..times.len().max(1) as f64, metric_min..metric_max * 1.1)
            .map_err(|e| ServiceError::Plot(e.to_string()))?;
        metric_chart.configure_mesh().draw().map_err(|e| ServiceError::Plot(e.to_string()))?;

        for series in per_roi.values() {
            metric_chart
                .draw_series(LineSeries::new(series.iter().copied(), &BLUE))
                .map_err(|e| ServiceError::Plot(e.to_string()))?;
        }

        let temp_max = records
            .iter()
            .flat_map(|r| r.temperature_readings.as_ref().into_iter().flat_map(|m| m.values().copied()))
            .fold(1.0_f64, f64::max);
        let mut temp_chart = ChartBuilder::on(&lower)
            .caption("Temperatures over time", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(0.0..times.len().max(1) as f64, 0.0..temp_max * 1.1)
            .map_err(|e| ServiceError::Plot(e.to_string()))?;
        temp_chart.configure_mesh().draw().map_err(|e| ServiceError::Plot(e.to_string()))?;

        let mut per_sensor: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(temps) = &record.temperature_readings {
                for (sensor, value) in temps {
                    per_sensor.entry(sensor.clone()).or_default().push((i as f64, *value));
                }
            }
        }
        for series in per_sensor.values() {
            temp_chart
                .draw_series(LineSeries::new(series.iter().copied(), &RED))
                .map_err(|e| ServiceError::Plot(e.to_string()))?;
        }

        root.present().map_err(|e| ServiceError::Plot(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use phorest_config::*;
    use phorest_core::manifest_entry::{CameraData, ManifestEntry};
    use phorest_core::result::ImageAnalysisRecord;
    use std::collections::HashMap;

    fn minimal_config(root: &std::path::Path) -> Config {
        Config {
            data_analysis: DataAnalysisConfig { method: AnalysisMethod::MaxIntensity, number_of_sub_rois: 0 },
            paths: PathsConfig {
                remote_root_dir: "/remote".into(),
                root_dir: root.to_string_lossy().to_string(),
                data_dir: root.join("data").to_string_lossy().to_string(),
                continuous_capture_dir: root.join("data/capture").to_string_lossy().to_string(),
                results_dir: root.join("results").to_string_lossy().to_string(),
                logs_dir: root.join("logs").to_string_lossy().to_string(),
                backup_dir: root.join("backup").to_string_lossy().to_string(),
                roi_manifest_filename: "roi_manifest.json".into(),
            },
            services: ServicesConfig {
                enable_camera: true,
                enable_thermocouple: false,
                enable_brightfield: false,
                enable_file_backup: true,
                enable_image_compression: true,
                enable_remote_sync: false,
                enable_service_health_check: true,
            },
            timing: TimingConfig {
                collector_interval: 1,
                processor_interval: 1,
                communicator_interval: 5,
                compress_interval: 30,
                poll_interval: 1,
                collector_retry_delay: 1,
                file_backup_interval: 3600,
                sync_interval: 3600,
            },
            retries: RetriesConfig { collector_failure_limit: 3 },
            buffer: BufferConfig { image_buffer_size: 500 },
            communication: CommunicationConfig { method: CommunicationMethod::CsvPlot },
            camera: CameraConfig {
                camera_type: CameraType::Dummy,
                camera_id: 0,
                camera_exposure: 0,
                camera_gain: 0,
                camera_brightness: 0,
                camera_contrast: 0,
                camera_transform: CameraTransform::None,
            },
            temperature: TemperatureConfig { thermocouple_sensors: HashMap::new() },
            storage: StorageConfig { usb_uuid: "0000-0000".into() },
            assets: AssetsConfig {
                roi_generation_image: "assets/reference.png".into(),
                label_template_dir: "assets/templates".into(),
                feature_locations_config: "assets/feature_locations.json".into(),
                roi_manifest_filename: "roi_manifest.json".into(),
                generated_files_dir: "assets/generated".into(),
            },
            development: DevelopmentConfig { debug_mode: false },
            brightfield: BrightfieldConfig { camera_id: None },
        }
    }

    #[tokio::test]
    async fn skips_cycle_entirely_when_nothing_is_untransmitted() {
        let dir = tempfile::tempdir().unwrap();
        let config = minimal_config(dir.path());
        let paths = Paths::from_config(&config);
        std::fs::create_dir_all(&paths.results_dir).unwrap();
        phorest_runtime::flag::touch(&paths.results_ready_flag).unwrap();

        let mut service = CommunicatorService::new(config, paths.clone());
        service.cycle().await;
        assert!(!paths.csv_path.exists());
    }

    #[tokio::test]
    async fn writes_csv_and_marks_processed_entries_transmitted() {
        let dir = tempfile::tempdir().unwrap();
        let config = minimal_config(dir.path());
        let paths = Paths::from_config(&config);
        std::fs::create_dir_all(&paths.results_dir).unwrap();

        let manifest = ManifestStore::new(&paths.manifest_path);
        let ts = Utc::now();
        let mut entry = ManifestEntry::new(
            ts,
            Some(CameraData {
                filename: "frame.png".into(),
                filepath: "frame.png".into(),
                timestamp_iso: ts,
                camera_index: 0,
                error_flag: false,
                error_message: None,
            }),
            None,
        );
        entry.processing_status = ProcessingStatus::Processed;
        manifest.add_entry(entry.clone()).unwrap();

        let results_log = ResultsLog::new(&paths.results_log_path);
        results_log
            .append(&ResultRecord {
                entry,
                image_analysis: Some(ImageAnalysisRecord { brightness: 10.0, contrast: 2.0, rois: vec![] }),
                temperature_readings: None,
            })
            .unwrap();

        phorest_runtime::flag::touch(&paths.results_ready_flag).unwrap();
        let mut service = CommunicatorService::new(config, paths.clone());
        service.cycle().await;

        assert!(paths.csv_path.exists());
        assert!(manifest.load().unwrap()[0].data_transmitted);
    }
}
