//! Deferred installer script generation.
//!
//! The script is the only state handed to the installer process. It waits for
//! the application to exit, copies the staged files over the installation with
//! retries, records the outcome in the status file, removes the staging
//! directory and pauses so the user can read the result.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{InstallerTiming, UpdaterConfig};
use crate::error::{Result, UpdateError};
use crate::platform::ScriptDialect;
use crate::version::Version;

/// Everything the script needs, with paths already rendered for its dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub staging_dir: String,
    pub install_dir: String,
    pub status_file: String,
    pub status_dir: String,
    pub version: String,
    pub previous_version: String,
    pub timing: InstallerTiming,
}

impl InstallPlan {
    /// Renders the configured directories through their anchor variables.
    pub fn from_config(config: &UpdaterConfig, version: &Version, previous: &Version) -> Self {
        let dialect = config.dialect();
        let status_dir = config
            .status_file()
            .parent()
            .unwrap_or_else(|| config.status_file().clone());
        Self {
            staging_dir: config.staging_dir().render(dialect),
            install_dir: config.install_dir().render(dialect),
            status_file: config.status_file().render(dialect),
            status_dir: status_dir.render(dialect),
            version: version.to_string(),
            previous_version: previous.to_string(),
            timing: config.timing(),
        }
    }
}

/// A rendered installer, ready to be written and launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerScript {
    pub path: PathBuf,
    pub dialect: ScriptDialect,
    pub content: String,
}

impl InstallerScript {
    /// Renders the installer for the configured dialect and script location.
    pub fn generate(config: &UpdaterConfig, version: &Version, previous: &Version) -> Self {
        let plan = InstallPlan::from_config(config, version, previous);
        Self {
            path: config.installer_script().resolve(),
            dialect: config.dialect(),
            content: config.dialect().render(&plan),
        }
    }

    /// Writes the script, creating its directory if needed.
    ///
    /// Content and path must be ASCII so `cmd` and `sh` read them the same
    /// way regardless of the console code page or locale.
    pub fn write(&self) -> Result<&Path> {
        if !self.content.is_ascii() {
            return Err(UpdateError::script_write(
                &self.path,
                "script content contains non-ASCII characters",
            ));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::script_write(&self.path, e))?;
        }
        fs::write(&self.path, &self.content).map_err(|e| UpdateError::script_write(&self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o755))
                .map_err(|e| UpdateError::script_write(&self.path, e))?;
        }

        tracing::info!(dialect = %self.dialect, "Installer script written: {:?}", self.path);
        Ok(&self.path)
    }
}
