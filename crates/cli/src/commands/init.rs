//! `phorest init` — bootstrap a fresh deployment's directory layout so the
//! first service to start doesn't race creating `DATA_DIR`/`RESULTS_DIR`/
//! etc. independently.

use crate::error::{CliError, CliResult};
use phorest_config::Config;
use phorest_manifest::{ManifestStore, StatusFile};
use phorest_runtime::Paths;
use std::path::Path;

pub fn run(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let paths = Paths::from_config(&config);

    for dir in [
        &paths.data_dir,
        &paths.continuous_capture_dir,
        &paths.results_dir,
        &paths.logs_dir,
        &paths.backup_dir,
    ] {
        std::fs::create_dir_all(dir).map_err(|source| CliError::CreateDir { path: dir.clone(), source })?;
    }

    // Touching the manifest/status file now means `phorest status` has
    // something to read even before the Collector has run once.
    let manifest = ManifestStore::new(&paths.manifest_path);
    if manifest.load()?.is_empty() {
        manifest.save(&[])?;
    }
    StatusFile::new(&paths.status_path).initialise()?;

    println!("initialised phorest directories under {}", paths.root_dir.display());
    for dir in [&paths.data_dir, &paths.results_dir, &paths.logs_dir, &paths.backup_dir] {
        println!("  {}", dir.display());
    }
    Ok(())
}
