//! Copying the located application into the staging directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};

/// Result of populating the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPayload {
    pub dir: PathBuf,
    /// Number of files (and symlinks) copied.
    pub files: u64,
    /// Total size of the copied files.
    pub bytes: u64,
}

fn copy_tree(src: &Path, dst: &Path, staged: &mut StagedPayload) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_tree(&entry.path(), &target, staged)?;
        } else if file_type.is_symlink() {
            copy_symlink(&entry.path(), &target)?;
            staged.files += 1;
        } else {
            // fs::copy carries the permission bits over.
            staged.bytes += fs::copy(entry.path(), &target)?;
            staged.files += 1;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

/// Replaces the staging directory with a copy of `app_root`.
///
/// The live installation is not touched here; a failure leaves at most a
/// partial staging directory that the next cycle removes.
pub fn stage_payload(app_root: &Path, staging_dir: &Path) -> Result<StagedPayload> {
    if staging_dir.exists() {
        tracing::debug!("Removing previous staging directory: {:?}", staging_dir);
        fs::remove_dir_all(staging_dir).map_err(|e| UpdateError::staging(staging_dir, e))?;
    }

    let mut staged = StagedPayload {
        dir: staging_dir.to_path_buf(),
        files: 0,
        bytes: 0,
    };
    copy_tree(app_root, staging_dir, &mut staged)
        .map_err(|e| UpdateError::staging(staging_dir, e))?;

    tracing::info!(
        files = staged.files,
        bytes = staged.bytes,
        "Staged update files in: {:?}",
        staging_dir
    );
    Ok(staged)
}
