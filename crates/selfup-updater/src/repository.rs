//! The update repository collaborator.
//!
//! The cycle only needs two things from a repository: whether a newer release
//! exists, and a verified local copy of its archive.

use std::path::PathBuf;

use serde_json::Value;

use crate::config::UpdateChannel;
use crate::error::Result;
use crate::steps::progress::DownloadProgress;
use crate::version::Version;

/// A release newer than the running application.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDescriptor {
    pub version: Version,
    /// File name of the archive (`app-2.0.0-x86_64-unknown-linux-gnu.tar.gz`).
    pub archive_name: String,
    /// Archive size in bytes.
    pub length: u64,
    /// Free-form release metadata; a `changes` array is shown to the user.
    pub custom: Option<Value>,
    /// Where the repository fetches the archive from.
    pub locator: String,
    /// Expected SHA-256 digest, `sha256:<hex>`.
    pub digest: Option<String>,
}

impl UpdateDescriptor {
    /// Entries of the `changes` list in the custom metadata.
    #[must_use]
    pub fn changes(&self) -> Vec<String> {
        self.custom
            .as_ref()
            .and_then(|custom| custom.get("changes"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for UpdateDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.version, self.archive_name)
    }
}

/// Source of updates: finds newer releases and downloads verified archives.
pub trait UpdateRepository {
    /// Returns the newest release on `channel` that is newer than the running
    /// version, if any.
    fn check_for_updates(&mut self, channel: UpdateChannel) -> Result<Option<UpdateDescriptor>>;

    /// Downloads the archive, verifies its length and digest, and returns its
    /// local path. `progress` is called synchronously as bytes arrive.
    fn download(
        &mut self,
        update: &UpdateDescriptor,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(custom: Option<Value>) -> UpdateDescriptor {
        UpdateDescriptor {
            version: Version::new(2, 0, 0),
            archive_name: "my_app-2.0.0.tar.gz".to_string(),
            length: 1024,
            custom,
            locator: "https://example.com/my_app-2.0.0.tar.gz".to_string(),
            digest: None,
        }
    }

    #[test]
    fn test_changes_from_custom_metadata() {
        let update = descriptor(Some(json!({"changes": ["Faster startup", 42]})));
        assert_eq!(update.changes(), vec!["Faster startup", "42"]);
    }

    #[test]
    fn test_changes_absent() {
        assert!(descriptor(None).changes().is_empty());
        assert!(descriptor(Some(json!({"notes": "x"}))).changes().is_empty());
        assert!(descriptor(Some(json!({"changes": "not a list"}))).changes().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(descriptor(None).to_string(), "2.0.0 (my_app-2.0.0.tar.gz)");
    }
}
