//! First-run preparation of the application directories.

use std::fs;

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};

/// Creates the install, metadata and download directories and copies the
/// shipped trust anchor into the metadata directory if it is not there yet.
///
/// An existing trust anchor is never overwritten; the update client rotates
/// it through the metadata it verifies.
pub fn ensure_layout(config: &UpdaterConfig) -> Result<()> {
    for dir in [
        config.install_dir(),
        config.metadata_dir(),
        config.target_dir(),
    ] {
        let path = dir.resolve();
        fs::create_dir_all(&path).map_err(|e| {
            UpdateError::Bootstrap(format!("failed to create {}: {e}", path.display()))
        })?;
    }

    let destination = config.trusted_root_destination();
    if destination.exists() {
        return Ok(());
    }

    let source = config.trusted_root_source();
    fs::copy(source, &destination).map_err(|e| {
        UpdateError::Bootstrap(format!(
            "failed to copy trust anchor from {}: {e}",
            source.display()
        ))
    })?;
    tracing::info!("Trusted root metadata copied to cache: {:?}", destination);
    Ok(())
}
