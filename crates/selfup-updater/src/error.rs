//! Error types for the update cycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while checking for, staging and handing off an update.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdateError {
    /// Failed to parse version string.
    #[error("invalid version format: {0}")]
    InvalidVersion(String),

    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The update archive could not be downloaded.
    #[error("download error: {0}")]
    Download(String),

    /// The downloaded archive did not match what the repository announced.
    #[error("verification error: {0}")]
    Verification(String),

    /// SHA256 checksum verification failed.
    #[error("checksum verification failed: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Expected SHA256 hash from the repository.
        expected: String,
        /// Actual SHA256 hash of the downloaded archive.
        actual: String,
    },

    /// Release asset has no digest available for verification.
    #[error("no digest available for verification")]
    NoDigestAvailable,

    /// No suitable release asset found for the current platform.
    #[error("no release asset found for target: {0}")]
    NoAssetFound(String),

    /// GitHub API rate limit exceeded.
    #[error("GitHub API rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited {
        /// Seconds until rate limit resets.
        retry_after: u64,
    },

    /// Archive extraction failed.
    #[error("failed to extract {archive}: {reason}")]
    Extraction {
        /// The archive being extracted.
        archive: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Copying the located payload into the staging directory failed.
    #[error("failed to stage update into {staging_dir}: {reason}")]
    Staging {
        /// The staging directory being populated.
        staging_dir: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The deferred installer script could not be written.
    #[error("failed to write installer script {path}: {reason}")]
    ScriptWrite {
        /// Where the script was to be written.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The deferred installer process could not be launched.
    #[error("failed to launch installer: {0}")]
    Handoff(String),

    /// Application directories or the trust anchor could not be prepared.
    #[error("bootstrap error: {0}")]
    Bootstrap(String),

    /// Invalid configuration (missing environment, non-ASCII names).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(String),

    /// Failed to parse JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl UpdateError {
    /// Returns a user-friendly error message suitable for printing to the console.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) | Self::Download(_) => {
                "Could not download the update. Please check your internet connection."
            }
            Self::Verification(_) | Self::ChecksumMismatch { .. } => {
                "Security verification failed. The download may have been tampered with."
            }
            Self::NoDigestAvailable => "Security verification not available for this release.",
            Self::NoAssetFound(_) => "No update available for your platform.",
            Self::RateLimited { .. } => "Update server rate limit reached. Please try again later.",
            Self::Extraction { .. } => "Could not extract the update package.",
            Self::Staging { .. } => {
                "Could not prepare the update files. Check available disk space and permissions."
            }
            Self::ScriptWrite { .. } | Self::Handoff(_) => {
                "Could not start the installer. Your current installation was not changed."
            }
            Self::Bootstrap(_) | Self::Config(_) => {
                "The application directories could not be prepared."
            }
            Self::InvalidVersion(_) | Self::Io(_) | Self::JsonParse(_) => {
                "An unexpected error occurred."
            }
        }
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Download(_) | Self::RateLimited { .. } | Self::Io(_)
        )
    }

    pub(crate) fn extraction(archive: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Extraction {
            archive: archive.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn staging(staging_dir: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Staging {
            staging_dir: staging_dir.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn script_write(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::ScriptWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<std::io::Error> for UpdateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for UpdateError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
