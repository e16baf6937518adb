//! Cross-service scenario tests (`spec.md` §8): these wire several
//! services against the same on-disk manifest within one process, which
//! the per-crate unit tests (one service at a time) cannot exercise.

#[path = "support/mod.rs"]
mod support;

#[path = "specs/happy_path.rs"]
mod happy_path;

#[path = "specs/compressor_catch_up.rs"]
mod compressor_catch_up;

#[path = "specs/ring_buffer_and_sync.rs"]
mod ring_buffer_and_sync;

#[path = "specs/corrupt_manifest_recovery.rs"]
mod corrupt_manifest_recovery;

#[path = "specs/cli.rs"]
mod cli;
