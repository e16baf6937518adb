//! Scenario 3 (`spec.md` §8): the ring buffer must not delete a capture
//! the Syncer hasn't copied off-device yet, when remote sync is enabled.
//! This wires a real `SyncerService` cycle against the same manifest the
//! Collector reads, rather than hand-setting `image_synced` as the
//! per-crate unit tests do.

use crate::support::Harness;
use phorest_drivers::DummyCameraDriver;
use phorest_services::collector::CollectorService;
use phorest_services::syncer::SyncerService;

#[tokio::test]
async fn unsynced_captures_survive_eviction_until_the_syncer_copies_them_off() {
    let h = Harness::new().with_buffer_size(2).with_remote_sync(true);
    let mut collector =
        CollectorService::new(h.config.clone(), h.paths.clone(), Box::new(DummyCameraDriver::new()), None).unwrap();

    for _ in 0..4 {
        collector.cycle().await;
    }

    // Remote sync is enabled but nothing has run the Syncer yet: every
    // capture must still be on disk even though 4 > buffer size 2.
    let entries = h.manifest().load().unwrap();
    let on_disk = entries
        .iter()
        .filter(|e| e.camera_data.as_ref().map(|c| h.paths.continuous_capture_dir.join(&c.filename).exists()).unwrap_or(false))
        .count();
    assert_eq!(on_disk, 4, "ring buffer must not evict unsynced captures");

    // Mark every capture processed so the Syncer considers it; run a real
    // sync cycle, then let the Collector clean up again.
    let entries = h.manifest().load().unwrap();
    let indices: Vec<usize> = (0..entries.len()).collect();
    h.manifest()
        .update(
            &indices,
            &phorest_manifest::ManifestUpdate {
                processing_status: Some(phorest_manifest::UpdateValue::Scalar(
                    phorest_core::manifest_entry::ProcessingStatus::Processed,
                )),
                ..Default::default()
            },
        )
        .unwrap();

    let mut syncer = SyncerService::new(h.config.clone(), h.paths.clone());
    syncer.cycle().await;

    let entries = h.manifest().load().unwrap();
    assert!(entries.iter().all(|e| e.image_synced), "syncer should mark every processed capture synced");

    // One more collector cycle: now that everything is synced, the ring
    // buffer is free to evict down to its configured size.
    collector.cycle().await;
    let entries = h.manifest().load().unwrap();
    let on_disk = entries
        .iter()
        .filter(|e| {
            e.camera_data
                .as_ref()
                .map(|c| h.paths.continuous_capture_dir.join(&c.filename).exists() || h.paths.remote_data_dir.join(&c.filename).exists())
                .unwrap_or(false)
        })
        .count();
    assert_eq!(entries.len(), 5);
    assert_eq!(on_disk, 5, "synced captures were moved to remote, not deleted outright");
}
