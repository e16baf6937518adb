use crate::atomic::{load_json_or_recover, save_json};
use crate::error::ManifestError;
use crate::lock::FileLock;
use phorest_core::manifest_entry::{ManifestEntry, ProcessingStatus};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One field's worth of batched update values: either one value broadcast
/// to every index in the call, or one value per index (must match the
/// index list's length or the whole field update is skipped with a
/// warning — there is no way to know which index a mis-sized list was
/// meant for).
#[derive(Debug, Clone)]
pub enum UpdateValue<T> {
    Scalar(T),
    PerIndex(Vec<T>),
}

impl<T: Clone> UpdateValue<T> {
    fn resolve(&self, count: usize, field: &str) -> Option<Vec<T>> {
        match self {
            UpdateValue::Scalar(v) => Some(std::iter::repeat(v.clone()).take(count).collect()),
            UpdateValue::PerIndex(vs) => {
                if vs.len() == count {
                    Some(vs.clone())
                } else {
                    warn!(field, expected = count, got = vs.len(), "per-index update length mismatch, skipping field");
                    None
                }
            }
        }
    }
}

/// A batched field update, applied to a fixed list of manifest indices in
/// one locked load-mutate-save span. Every field is optional; only the
/// ones a caller sets are touched.
#[derive(Debug, Clone, Default)]
pub struct ManifestUpdate {
    pub processing_status: Option<UpdateValue<ProcessingStatus>>,
    pub processing_timestamp_iso: Option<UpdateValue<chrono::DateTime<chrono::Utc>>>,
    pub processing_error: Option<UpdateValue<bool>>,
    pub processing_error_msg: Option<UpdateValue<Option<String>>>,
    pub compression_attempted: Option<UpdateValue<bool>>,
    pub new_filename: Option<UpdateValue<Option<String>>>,
    pub data_transmitted: Option<UpdateValue<bool>>,
    pub image_synced: Option<UpdateValue<bool>>,
    pub new_filepath: Option<UpdateValue<Option<String>>>,
}

/// The shared manifest: a locked, atomically-replaced JSON array. Every
/// function here acquires the path's lock for exactly the span of its
/// critical section.
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ManifestStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locked read of the full entry list.
    pub fn load(&self) -> Result<Vec<ManifestEntry>, ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        load_json_or_recover(&self.path)
    }

    /// Locked full-array replace.
    pub fn save(&self, entries: &[ManifestEntry]) -> Result<(), ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        save_json(&self.path, &entries.to_vec())
    }

    /// Appends one entry and returns its new index, in one locked span.
    pub fn add_entry(&self, entry: ManifestEntry) -> Result<usize, ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries: Vec<ManifestEntry> = load_json_or_recover(&self.path)?;
        entries.push(entry);
        let index = entries.len() - 1;
        save_json(&self.path, &entries)?;
        Ok(index)
    }

    /// Applies a batched update to the given indices, in one locked
    /// load-mutate-save span. Indices that no longer exist (e.g. the
    /// manifest was rotated out from under an in-flight batch by the
    /// Backup service) are skipped with a warning rather than erroring —
    /// this is the crash-safe path for a shifted manifest.
    pub fn update(&self, indices: &[usize], updates: &ManifestUpdate) -> Result<(), ManifestError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries: Vec<ManifestEntry> = load_json_or_recover(&self.path)?;

        let count = indices.len();
        let statuses = updates.processing_status.as_ref().and_then(|v| v.resolve(count, "processing_status"));
        let timestamps = updates
            .processing_timestamp_iso
            .as_ref()
            .and_then(|v| v.resolve(count, "processing_timestamp_iso"));
        let proc_errors = updates.processing_error.as_ref().and_then(|v| v.resolve(count, "processing_error"));
        let proc_msgs = updates
            .processing_error_msg
            .as_ref()
            .and_then(|v| v.resolve(count, "processing_error_msg"));
        let compressed = updates
            .compression_attempted
            .as_ref()
            .and_then(|v| v.resolve(count, "compression_attempted"));
        let new_filenames = updates.new_filename.as_ref().and_then(|v| v.resolve(count, "new_filename"));
        let transmitted = updates.data_transmitted.as_ref().and_then(|v| v.resolve(count, "data_transmitted"));
        let synced = updates.image_synced.as_ref().and_then(|v| v.resolve(count, "image_synced"));
        let new_filepaths = updates.new_filepath.as_ref().and_then(|v| v.resolve(count, "new_filepath"));

        for (i, &index) in indices.iter().enumerate() {
            let Some(e) = entries.get_mut(index) else {
                warn!(index, "update targets an index that no longer exists, skipping");
                continue;
            };
            if let Some(v) = &statuses {
                e.processing_status = v[i];
            }
            if let Some(v) = &timestamps {
                e.processing_timestamp_iso = Some(v[i]);
            }
            if let Some(v) = &proc_errors {
                e.processing_error = v[i];
            }
            if let Some(v) = &proc_msgs {
                e.processing_error_msg = v[i].clone();
            }
            if let Some(v) = &compressed {
                e.compression_attempted = v[i];
            }
            if let Some(v) = &new_filenames {
                if let Some(name) = &v[i] {
                    if let Some(cam) = e.camera_data.as_mut() {
                        cam.filename = name.clone();
                    }
                }
                e.new_filename = v[i].clone();
            }
            if let Some(v) = &transmitted {
                e.data_transmitted = v[i];
            }
            if let Some(v) = &synced {
                e.image_synced = v[i];
            }
            if let Some(v) = &new_filepaths {
                e.new_filepath = v[i].clone();
            }
        }

        save_json(&self.path, &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store(dir: &tempfile::TempDir) -> ManifestStore {
        ManifestStore::new(dir.path().join("metadata_manifest.json"))
    }

    #[test]
    fn add_entry_assigns_sequential_indices() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let i0 = store.add_entry(ManifestEntry::new(Utc::now(), None, None)).unwrap();
        let i1 = store.add_entry(ManifestEntry::new(Utc::now(), None, None)).unwrap();
        assert_eq!(i0, 0);
        assert_eq!(i1, 1);
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn batched_update_broadcasts_scalar_and_applies_per_index_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        for _ in 0..3 {
            store.add_entry(ManifestEntry::new(Utc::now(), None, None)).unwrap();
        }
        let update = ManifestUpdate {
            processing_status: Some(UpdateValue::PerIndex(vec![
                ProcessingStatus::Processed,
                ProcessingStatus::Failed,
                ProcessingStatus::Processed,
            ])),
            processing_error: Some(UpdateValue::Scalar(false)),
            ..Default::default()
        };
        store.update(&[0, 1, 2], &update).unwrap();
        let entries = store.load().unwrap();
        assert_eq!(entries[0].processing_status, ProcessingStatus::Processed);
        assert_eq!(entries[1].processing_status, ProcessingStatus::Failed);
        assert!(!entries[2].processing_error);
    }

    #[test]
    fn unknown_index_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.add_entry(ManifestEntry::new(Utc::now(), None, None)).unwrap();
        let update = ManifestUpdate {
            processing_status: Some(UpdateValue::Scalar(ProcessingStatus::Processed)),
            ..Default::default()
        };
        // Index 5 doesn't exist; should not error.
        store.update(&[0, 5], &update).unwrap();
        assert_eq!(store.load().unwrap()[0].processing_status, ProcessingStatus::Processed);
    }

    #[test]
    fn mismatched_per_index_length_skips_that_field_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.add_entry(ManifestEntry::new(Utc::now(), None, None)).unwrap();
        store.add_entry(ManifestEntry::new(Utc::now(), None, None)).unwrap();
        let update = ManifestUpdate {
            processing_status: Some(UpdateValue::PerIndex(vec![ProcessingStatus::Processed])), // wrong length
            processing_error: Some(UpdateValue::Scalar(true)),
            ..Default::default()
        };
        store.update(&[0, 1], &update).unwrap();
        let entries = store.load().unwrap();
        // processing_status untouched (still pending) but processing_error applied.
        assert_eq!(entries[0].processing_status, ProcessingStatus::Pending);
        assert!(entries[0].processing_error);
    }
}
