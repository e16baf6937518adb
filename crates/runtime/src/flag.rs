use std::io;
use std::path::Path;

/// Touches a zero-byte flag file, creating it if absent. Mirrors `touch`:
/// an already-present flag is left alone rather than truncated.
pub fn touch(path: &Path) -> io::Result<()> {
    match std::fs::OpenOptions::new().create(true).write(true).truncate(false).open(path) {
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Atomically checks for and consumes a flag file: returns `true` and
/// removes the file if it was present, `false` if it wasn't there at all.
/// A `NotFound` error from the remove is treated as "someone else already
/// consumed it this instant" rather than a failure.
pub fn consume(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
