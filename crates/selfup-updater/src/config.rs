//! Configuration for the update cycle.
//!
//! Every directory the cycle touches is an [`AnchoredPath`]: an environment
//! variable plus relative components. The live process resolves it to an
//! absolute path; the deferred installer script references it through the
//! variable, so the script stays ASCII even when the user's profile path is not.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UpdateError};
use crate::platform::ScriptDialect;
use crate::version::Version;

/// Update channel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateChannel {
    /// Only receive stable releases.
    #[default]
    Stable,
    /// Receive alpha, beta, rc and stable releases.
    Alpha,
    /// Receive beta, rc and stable releases.
    Beta,
    /// Receive release candidates and stable releases.
    ReleaseCandidate,
}

impl UpdateChannel {
    /// Maps a command-line token (`a`, `b`, `rc`) to its channel.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "a" => Some(Self::Alpha),
            "b" => Some(Self::Beta),
            "rc" => Some(Self::ReleaseCandidate),
            _ => None,
        }
    }

    /// Lowest pre-release stage this channel accepts, `None` for stable only.
    const fn min_stage(self) -> Option<u8> {
        match self {
            Self::Stable => None,
            Self::Alpha => Some(0),
            Self::Beta => Some(1),
            Self::ReleaseCandidate => Some(2),
        }
    }

    /// Check if a version should be offered on this channel.
    #[must_use]
    pub fn includes(&self, version: &Version) -> bool {
        match (version.pre_release, self.min_stage()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(pre), Some(min)) => pre.stage() >= min,
        }
    }

    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::Alpha => "Alpha",
            Self::Beta => "Beta",
            Self::ReleaseCandidate => "Release candidate",
        }
    }
}

impl fmt::Display for UpdateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An environment variable and the directory it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAnchor {
    var: String,
    base: PathBuf,
}

impl PathAnchor {
    /// Creates an anchor with an explicit base directory.
    pub fn new(var: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        Self {
            var: var.into(),
            base: base.into(),
        }
    }

    /// Reads `var` from the environment, falling back to `fallback`.
    ///
    /// The launcher exports the resolved value again, so a fallback base is
    /// still what the installer script sees.
    pub fn from_env(var: &str, fallback: Option<PathBuf>) -> Result<Self> {
        let base = std::env::var_os(var)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or(fallback)
            .ok_or_else(|| {
                UpdateError::Config(format!("environment variable {var} is not set"))
            })?;

        if !base.is_absolute() {
            return Err(UpdateError::Config(format!(
                "{var} must be an absolute path, got {}",
                base.display()
            )));
        }

        Ok(Self::new(var, base))
    }

    /// The environment variable name.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }

    /// The directory the variable resolved to.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }
}

/// A path expressed relative to a [`PathAnchor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredPath {
    anchor: PathAnchor,
    relative: Vec<String>,
}

impl AnchoredPath {
    pub fn new(anchor: &PathAnchor, relative: &[&str]) -> Self {
        Self {
            anchor: anchor.clone(),
            relative: relative.iter().map(|part| (*part).to_string()).collect(),
        }
    }

    /// Returns a new path with `part` appended.
    #[must_use]
    pub fn join(&self, part: &str) -> Self {
        let mut joined = self.clone();
        joined.relative.push(part.to_string());
        joined
    }

    #[must_use]
    pub fn anchor(&self) -> &PathAnchor {
        &self.anchor
    }

    /// Absolute path for the running process.
    #[must_use]
    pub fn resolve(&self) -> PathBuf {
        self.relative
            .iter()
            .fold(self.anchor.base.clone(), |path, part| path.join(part))
    }

    /// Parent directory, if there are relative components left.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let mut parent = self.clone();
        parent.relative.pop()?;
        Some(parent)
    }

    /// Variable-relative form for the installer script (unquoted).
    #[must_use]
    pub fn render(&self, dialect: ScriptDialect) -> String {
        let (mut rendered, separator) = match dialect {
            ScriptDialect::Batch => (format!("%{}%", self.anchor.var), '\\'),
            ScriptDialect::Shell => (format!("${}", self.anchor.var), '/'),
        };
        for part in &self.relative {
            rendered.push(separator);
            rendered.push_str(part);
        }
        rendered
    }
}

/// Timing of the deferred installer's wait and copy retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallerTiming {
    /// Wait before the first copy attempt.
    pub initial_wait: Duration,
    /// Copy attempts before giving up.
    pub attempts: u32,
    /// Delay after the first failed attempt; doubles each time.
    pub backoff: Duration,
    /// Upper bound for the doubling delay.
    pub backoff_cap: Duration,
}

impl Default for InstallerTiming {
    fn default() -> Self {
        Self {
            initial_wait: Duration::from_secs(5),
            attempts: 10,
            backoff: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(16),
        }
    }
}

impl InstallerTiming {
    /// Delays between consecutive attempts, in whole seconds.
    #[must_use]
    pub fn retry_delays(&self) -> Vec<u64> {
        let cap = self.backoff_cap.as_secs().max(1);
        let mut delay = self.backoff.as_secs().clamp(1, cap);
        let mut delays = Vec::new();
        for _ in 1..self.attempts {
            delays.push(delay);
            delay = (delay * 2).min(cap);
        }
        delays
    }
}

/// Characters allowed in the application name, which ends up inside script text
/// and as a single component of every application path.
fn is_script_safe(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.chars().all(|c| c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
}

/// Name of the trust anchor shipped with the application.
pub const TRUSTED_ROOT_FILE: &str = "root.json";

/// Filesystem layout and tunables for one application.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    app_name: String,
    entry_point: String,
    dialect: ScriptDialect,
    install_dir: AnchoredPath,
    metadata_dir: AnchoredPath,
    target_dir: AnchoredPath,
    extraction_dir: AnchoredPath,
    staging_dir: AnchoredPath,
    installer_script: AnchoredPath,
    status_file: AnchoredPath,
    trusted_root_source: PathBuf,
    timing: InstallerTiming,
    progress_delay: Duration,
    handoff_settle: Duration,
}

impl UpdaterConfig {
    /// Builds the configuration from the process environment.
    ///
    /// Windows anchors on `LOCALAPPDATA` and `TEMP`; everything else on `HOME`
    /// and `TMPDIR`. The trust anchor is expected next to the running executable.
    pub fn from_environment(app_name: &str) -> Result<Self> {
        let dialect = ScriptDialect::native();
        let (local, scratch) = match dialect {
            ScriptDialect::Batch => (
                PathAnchor::from_env("LOCALAPPDATA", dirs::data_local_dir())?,
                PathAnchor::from_env("TEMP", Some(std::env::temp_dir()))?,
            ),
            ScriptDialect::Shell => (
                PathAnchor::from_env("HOME", dirs::home_dir())?,
                PathAnchor::from_env("TMPDIR", Some(std::env::temp_dir()))?,
            ),
        };

        let mut config = Self::for_dialect(dialect, local, scratch, app_name)?;
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            config.trusted_root_source = exe_dir.join(TRUSTED_ROOT_FILE);
        }
        Ok(config)
    }

    /// Builds the configuration for the native script dialect from explicit anchors.
    pub fn new(local: PathAnchor, scratch: PathAnchor, app_name: &str) -> Result<Self> {
        Self::for_dialect(ScriptDialect::native(), local, scratch, app_name)
    }

    /// Builds the configuration for a specific script dialect.
    pub fn for_dialect(
        dialect: ScriptDialect,
        local: PathAnchor,
        scratch: PathAnchor,
        app_name: &str,
    ) -> Result<Self> {
        if !is_script_safe(app_name) {
            return Err(UpdateError::Config(format!(
                "application name {app_name:?} must be ASCII letters, digits, '-', '_', '.' or inner spaces, and not only dots"
            )));
        }

        let layout = match dialect {
            ScriptDialect::Batch => Layout {
                entry_point: "main.exe",
                install_dir: AnchoredPath::new(&local, &["Programs", app_name]),
                data_dir: AnchoredPath::new(&local, &[app_name]),
                cache_dir: AnchoredPath::new(&local, &[app_name]),
                staging_dir: AnchoredPath::new(&local, &["Temp", "upd"]),
                installer_script: AnchoredPath::new(&local, &["Temp", "upd_install.bat"]),
            },
            ScriptDialect::Shell => Layout {
                entry_point: "main",
                install_dir: AnchoredPath::new(&local, &[".local", "opt", app_name]),
                data_dir: AnchoredPath::new(&local, &[".local", "share", app_name]),
                cache_dir: AnchoredPath::new(&local, &[".cache", app_name]),
                staging_dir: AnchoredPath::new(&local, &[".cache", app_name, "upd"]),
                installer_script: AnchoredPath::new(&local, &[".cache", app_name, "upd_install.sh"]),
            },
        };

        let trusted_root_source = layout.install_dir.resolve().join(TRUSTED_ROOT_FILE);
        Ok(Self {
            app_name: app_name.to_string(),
            entry_point: layout.entry_point.to_string(),
            dialect,
            metadata_dir: layout.data_dir.join("metadata"),
            status_file: layout.data_dir.join("update_status.json"),
            target_dir: layout.cache_dir.join("targets"),
            extraction_dir: AnchoredPath::new(&scratch, &[format!("{app_name}_update").as_str()]),
            install_dir: layout.install_dir,
            staging_dir: layout.staging_dir,
            installer_script: layout.installer_script,
            trusted_root_source,
            timing: InstallerTiming::default(),
            progress_delay: Duration::from_millis(200),
            handoff_settle: Duration::from_secs(2),
        })
    }

    /// Set the installer wait and retry timing.
    #[must_use]
    pub fn with_timing(mut self, timing: InstallerTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set the pause after each progress update.
    #[must_use]
    pub fn with_progress_delay(mut self, delay: Duration) -> Self {
        self.progress_delay = delay;
        self
    }

    /// Set how long to wait after launching the installer before exiting.
    #[must_use]
    pub fn with_handoff_settle(mut self, settle: Duration) -> Self {
        self.handoff_settle = settle;
        self
    }

    /// Set the file name searched for when locating the application root.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Set where the shipped trust anchor is copied from.
    #[must_use]
    pub fn with_trusted_root_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.trusted_root_source = path.into();
        self
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    #[must_use]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    #[must_use]
    pub fn dialect(&self) -> ScriptDialect {
        self.dialect
    }

    #[must_use]
    pub fn install_dir(&self) -> &AnchoredPath {
        &self.install_dir
    }

    #[must_use]
    pub fn metadata_dir(&self) -> &AnchoredPath {
        &self.metadata_dir
    }

    /// Download cache for update archives.
    #[must_use]
    pub fn target_dir(&self) -> &AnchoredPath {
        &self.target_dir
    }

    /// Scratch directory the archive is unpacked into.
    #[must_use]
    pub fn extraction_dir(&self) -> &AnchoredPath {
        &self.extraction_dir
    }

    #[must_use]
    pub fn staging_dir(&self) -> &AnchoredPath {
        &self.staging_dir
    }

    #[must_use]
    pub fn installer_script(&self) -> &AnchoredPath {
        &self.installer_script
    }

    #[must_use]
    pub fn status_file(&self) -> &AnchoredPath {
        &self.status_file
    }

    #[must_use]
    pub fn trusted_root_source(&self) -> &Path {
        &self.trusted_root_source
    }

    #[must_use]
    pub fn trusted_root_destination(&self) -> PathBuf {
        self.metadata_dir.resolve().join(TRUSTED_ROOT_FILE)
    }

    #[must_use]
    pub fn timing(&self) -> InstallerTiming {
        self.timing
    }

    #[must_use]
    pub fn progress_delay(&self) -> Duration {
        self.progress_delay
    }

    #[must_use]
    pub fn handoff_settle(&self) -> Duration {
        self.handoff_settle
    }

    /// Distinct anchors the installer script references.
    #[must_use]
    pub fn script_anchors(&self) -> Vec<&PathAnchor> {
        let mut anchors: Vec<&PathAnchor> = Vec::new();
        for path in [
            &self.staging_dir,
            &self.install_dir,
            &self.status_file,
            &self.installer_script,
        ] {
            if !anchors.iter().any(|known| known.var == path.anchor.var) {
                anchors.push(&path.anchor);
            }
        }
        anchors
    }
}

struct Layout {
    entry_point: &'static str,
    install_dir: AnchoredPath,
    data_dir: AnchoredPath,
    cache_dir: AnchoredPath,
    staging_dir: AnchoredPath,
    installer_script: AnchoredPath,
}
