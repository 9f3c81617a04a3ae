//! Archive extraction into the scratch directory.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{Result, UpdateError};

/// Removes the verbatim prefix `canonicalize` adds on Windows (`\\?\C:\...`),
/// which batch files and most tools cannot handle.
fn strip_verbatim(path: PathBuf) -> PathBuf {
    #[cfg(windows)]
    {
        let text = path.to_string_lossy();
        if let Some(rest) = text.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{rest}"));
        }
        if let Some(rest) = text.strip_prefix(r"\\?\") {
            return PathBuf::from(rest);
        }
    }
    path
}

/// Recreates `scratch_dir` empty and returns its canonical absolute form.
fn prepare_scratch(scratch_dir: &Path) -> std::io::Result<PathBuf> {
    if scratch_dir.exists() {
        tracing::debug!("Removing previous extraction: {:?}", scratch_dir);
        fs::remove_dir_all(scratch_dir)?;
    }
    fs::create_dir_all(scratch_dir)?;
    Ok(strip_verbatim(fs::canonicalize(scratch_dir)?))
}

fn unpack(archive_path: &Path, dest: &Path) -> std::io::Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive.unpack(dest)
}

/// Unpacks a `.tar.gz` archive into a freshly created scratch directory.
///
/// Any previous content of `scratch_dir` is removed first. Returns the
/// canonical path of the scratch directory. On failure the partially filled
/// directory is removed again before the error is returned.
pub fn stage_archive(archive_path: &Path, scratch_dir: &Path) -> Result<PathBuf> {
    let dest = prepare_scratch(scratch_dir)
        .map_err(|e| UpdateError::extraction(archive_path, format!("{:?}: {e}", scratch_dir)))?;

    tracing::info!("Extracting to: {:?}", dest);
    if let Err(e) = unpack(archive_path, &dest) {
        if let Err(cleanup) = fs::remove_dir_all(&dest) {
            tracing::warn!(error = %cleanup, "Failed to remove partial extraction: {:?}", dest);
        }
        return Err(UpdateError::extraction(archive_path, e));
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *contents).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extracts_into_fresh_directory() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("app-2.0.0.tar.gz");
        write_archive(&archive, &[("app/main", b"binary"), ("app/data.txt", b"data")]);

        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        fs::write(scratch.join("stale.txt"), "old").unwrap();

        let dest = stage_archive(&archive, &scratch).unwrap();
        assert!(dest.is_absolute());
        assert_eq!(fs::read(dest.join("app/main")).unwrap(), b"binary");
        assert!(!dest.join("stale.txt").exists());
    }

    #[test]
    fn test_running_twice_succeeds() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("update.tar.gz");
        write_archive(&archive, &[("main", b"v2")]);
        let scratch = temp.path().join("scratch");

        stage_archive(&archive, &scratch).unwrap();
        let dest = stage_archive(&archive, &scratch).unwrap();
        assert_eq!(fs::read(dest.join("main")).unwrap(), b"v2");
    }

    #[test]
    fn test_truncated_archive_is_removed() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("update.tar.gz");
        write_archive(&archive, &[("main", &[7u8; 64 * 1024])]);
        let bytes = fs::read(&archive).unwrap();
        File::create(&archive)
            .unwrap()
            .write_all(&bytes[..bytes.len() / 2])
            .unwrap();

        let scratch = temp.path().join("scratch");
        let err = stage_archive(&archive, &scratch).unwrap_err();
        assert!(matches!(err, UpdateError::Extraction { .. }));
        assert!(!scratch.exists());
    }

    #[test]
    fn test_missing_archive_is_extraction_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = stage_archive(&temp.path().join("absent.tar.gz"), &temp.path().join("s"))
            .unwrap_err();
        assert!(matches!(err, UpdateError::Extraction { .. }));
    }
}
