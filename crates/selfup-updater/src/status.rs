//! Install result file written by the deferred installer.
//!
//! The installer records its outcome as JSON; the next launch reads it once,
//! reports it and deletes it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of a deferred installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStatus {
    /// Whether the files were copied into the installation.
    pub success: bool,
    /// Version that was installed.
    pub version: String,
    /// Version that was running when the update was staged.
    pub previous_version: String,
    /// Copy attempts the installer made.
    #[serde(default)]
    pub attempts: u32,
    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the installer wrote the file, taken from its modification time.
    #[serde(skip)]
    pub written_at: Option<DateTime<Utc>>,
}

impl InstallStatus {
    /// Reads the status file, `None` if there is none.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut status: Self = serde_json::from_str(content.trim())?;
        status.written_at = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(Some(status))
    }

    /// Reads and deletes the status file so each result is reported once.
    ///
    /// An unparseable file is deleted as well.
    pub fn take(path: &Path) -> Result<Option<Self>> {
        let status = Self::read(path);
        Self::clear(path)?;
        status
    }

    /// Deletes the status file if present.
    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// One-line summary for the console.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.success {
            format!(
                "Updated from {} to {} ({} attempt(s)).",
                self.previous_version, self.version, self.attempts
            )
        } else {
            format!(
                "Update from {} to {} failed: {}",
                self.previous_version,
                self.version,
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpdateError;

    #[test]
    fn test_reads_installer_output() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("update_status.json");
        fs::write(
            &path,
            "{\"success\":true,\"version\":\"2.0.0\",\"previous_version\":\"1.0.0\",\"attempts\":3} \r\n",
        )
        .unwrap();

        let status = InstallStatus::read(&path).unwrap().unwrap();
        assert!(status.success);
        assert_eq!(status.attempts, 3);
        assert!(status.error.is_none());
        assert!(status.written_at.is_some());
        assert_eq!(status.summary(), "Updated from 1.0.0 to 2.0.0 (3 attempt(s)).");
    }

    #[test]
    fn test_take_consumes_once() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("update_status.json");
        let written = InstallStatus {
            success: false,
            version: "2.0.0".to_string(),
            previous_version: "1.0.0".to_string(),
            attempts: 10,
            error: Some("copy failed after 10 attempts".to_string()),
            written_at: None,
        };
        fs::write(&path, serde_json::to_string(&written).unwrap()).unwrap();

        let taken = InstallStatus::take(&path).unwrap().unwrap();
        assert_eq!(taken.error, written.error);
        assert!(taken.summary().contains("copy failed"));
        assert!(!path.exists());
        assert!(InstallStatus::take(&path).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_removed() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("update_status.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            InstallStatus::take(&path),
            Err(UpdateError::JsonParse(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let temp = tempfile::tempdir().unwrap();
        assert!(InstallStatus::clear(&temp.path().join("absent.json")).is_ok());
    }
}
