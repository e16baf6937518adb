use crate::error::ManifestError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// A held exclusive, blocking, advisory lock on `<path>.lock`.
///
/// Every read or write of a file designated "shared" (manifest, results
/// log, status file, CSV, plot, ROI manifest, config snapshot) must go
/// through one of these for the span of its critical section. The lock is
/// per-path and released on drop, covering every exit path including panics
/// unwinding through it (`fs2` drops release the OS lock when the file
/// descriptor closes).
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Blocks until the exclusive lock on `<target>.lock` is acquired.
    /// Lock acquisition itself has no timeout — a stuck lock is an
    /// operational incident for the health supervisor to surface, not
    /// something this primitive works around.
    pub fn acquire(target: &Path) -> Result<FileLock, ManifestError> {
        let lock_path = sibling_lock_path(target);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ManifestError::Io {
                path: lock_path.clone(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|source| ManifestError::Io { path: lock_path.clone(), source })?;
        file.lock_exclusive()
            .map_err(|source| ManifestError::Lock { path: lock_path.clone(), source })?;
        Ok(FileLock { _file: file, path: lock_path })
    }

    pub fn lock_path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Best-effort: the OS releases the lock on fd close regardless.
        let _ = fs2::FileExt::unlock(&self._file);
    }
}

pub fn sibling_lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}
