//! Scenario 4 (`spec.md` §7, §16): a truncated or otherwise invalid
//! manifest file must not wedge the pipeline. The Collector recovers by
//! renaming the bad file aside and starting from an empty manifest,
//! exercised here through the real service rather than the raw
//! `atomic::load_json_or_recover` primitive alone.

use crate::support::Harness;
use phorest_drivers::DummyCameraDriver;
use phorest_services::collector::CollectorService;

#[tokio::test]
async fn a_corrupt_manifest_is_renamed_aside_and_collection_continues() {
    let h = Harness::new();
    std::fs::write(&h.paths.manifest_path, b"{ this is not valid json").unwrap();

    let mut collector =
        CollectorService::new(h.config.clone(), h.paths.clone(), Box::new(DummyCameraDriver::new()), None).unwrap();
    collector.cycle().await;

    let entries = h.manifest().load().unwrap();
    assert_eq!(entries.len(), 1, "recovery starts from an empty manifest, not zero further progress");

    let siblings: Vec<_> = std::fs::read_dir(h.paths.manifest_path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert!(
        siblings.iter().any(|name| name.contains("corrupt")),
        "expected a renamed-aside corrupt manifest among {siblings:?}"
    );
}
