//! Scenario 2 (`spec.md` §8): the compressor drains a whole backlog of
//! already-processed captures in one cycle, independent of the collector
//! and processor that produced them.

use crate::support::{write_test_png, Harness};
use chrono::Utc;
use phorest_core::manifest_entry::{CameraData, ManifestEntry, ProcessingStatus};
use phorest_manifest::ManifestStore;
use phorest_services::compressor::CompressorService;

#[tokio::test]
async fn drains_the_whole_backlog_of_processed_uncompressed_frames_in_one_cycle() {
    let h = Harness::new();
    let manifest = ManifestStore::new(&h.paths.manifest_path);

    for i in 0..5 {
        let filename = format!("frame_{i}.png");
        write_test_png(&h.paths.continuous_capture_dir.join(&filename), i as u8);
        let mut entry = ManifestEntry::new(
            Utc::now(),
            Some(CameraData {
                filename: filename.clone(),
                filepath: filename,
                timestamp_iso: Utc::now(),
                camera_index: 0,
                error_flag: false,
                error_message: None,
            }),
            None,
        );
        entry.processing_status = ProcessingStatus::Processed;
        manifest.add_entry(entry).unwrap();
    }

    let mut compressor = CompressorService::new(h.config.clone(), h.paths.clone());
    compressor.cycle().await;

    let entries = manifest.load().unwrap();
    assert_eq!(entries.len(), 5);
    for (i, entry) in entries.iter().enumerate() {
        assert!(entry.compression_attempted);
        assert_eq!(entry.new_filename.as_deref(), Some(format!("frame_{i}.png.gz").as_str()));
        assert!(h.paths.continuous_capture_dir.join(format!("frame_{i}.png.gz")).exists());
        assert!(!h.paths.continuous_capture_dir.join(format!("frame_{i}.png")).exists());
    }

    // A second cycle against an already fully-compressed manifest is a no-op.
    compressor.cycle().await;
    let entries_again = manifest.load().unwrap();
    assert_eq!(entries, entries_again);
}
