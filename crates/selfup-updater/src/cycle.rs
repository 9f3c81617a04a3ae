//! One update cycle: check, download, stage and hand off.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{UpdateChannel, UpdaterConfig};
use crate::error::Result;
use crate::repository::{UpdateDescriptor, UpdateRepository};
use crate::status::InstallStatus;
use crate::steps::extract::stage_archive;
use crate::steps::handoff::Launcher;
use crate::steps::locate::{AppRoot, locate_app_root};
use crate::steps::progress::ProgressReporter;
use crate::steps::script::InstallerScript;
use crate::steps::stage::{StagedPayload, stage_payload};
use crate::version::Version;

/// Width of the banner printed before handing off.
const BANNER_WIDTH: usize = 60;

/// Per-run choices from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOptions {
    pub channel: UpdateChannel,
    pub skip_confirmation: bool,
}

/// Filesystem locations used by one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    pub archive: PathBuf,
    pub extraction_dir: PathBuf,
    pub app_root: AppRoot,
    pub staging_dir: PathBuf,
    pub install_dir: PathBuf,
}

/// State reached once the installer is running.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub update: UpdateDescriptor,
    pub paths: StagingPaths,
    pub staged: StagedPayload,
    pub script: InstallerScript,
}

/// How a cycle ended.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// No newer release on the selected channel.
    UpToDate,
    /// The user chose not to install the update.
    Declined(UpdateDescriptor),
    /// The deferred installer is running; the process must exit now.
    InstallerLaunched(Box<Handoff>),
}

type Confirm = Box<dyn FnMut(&UpdateDescriptor) -> bool>;
type RemoveDir = fn(&Path) -> io::Result<()>;

/// Drives one pass from update check to installer launch.
pub struct UpdateCycle<R, L, W = io::Stdout> {
    config: UpdaterConfig,
    current: Version,
    repository: R,
    launcher: L,
    console: W,
    confirm: Confirm,
    remove_extraction: RemoveDir,
}

impl<R: UpdateRepository, L: Launcher> UpdateCycle<R, L> {
    /// Creates a cycle that prints to stdout and installs without asking.
    pub fn new(config: UpdaterConfig, current: Version, repository: R, launcher: L) -> Self {
        Self {
            config,
            current,
            repository,
            launcher,
            console: io::stdout(),
            confirm: Box::new(|_| true),
            remove_extraction: |path: &Path| fs::remove_dir_all(path),
        }
    }
}

impl<R: UpdateRepository, L: Launcher, W: Write> UpdateCycle<R, L, W> {
    /// Redirects user-facing output.
    pub fn with_console<W2: Write>(self, console: W2) -> UpdateCycle<R, L, W2> {
        UpdateCycle {
            config: self.config,
            current: self.current,
            repository: self.repository,
            launcher: self.launcher,
            console,
            confirm: self.confirm,
            remove_extraction: self.remove_extraction,
        }
    }

    /// Asks before installing unless the run skips confirmation.
    #[must_use]
    pub fn with_confirmation(
        mut self,
        confirm: impl FnMut(&UpdateDescriptor) -> bool + 'static,
    ) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    #[cfg(test)]
    fn with_extraction_cleanup(mut self, remove: RemoveDir) -> Self {
        self.remove_extraction = remove;
        self
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn console(&self) -> &W {
        &self.console
    }

    /// Runs the cycle.
    ///
    /// Every failure up to and including script generation returns before the
    /// installer is launched, so the installation is left untouched.
    pub fn run(&mut self, options: CycleOptions) -> Result<CycleOutcome> {
        tracing::info!(
            current = %self.current,
            channel = %options.channel,
            "Checking for updates"
        );
        let Some(update) = self.repository.check_for_updates(options.channel)? else {
            tracing::info!("No update available");
            return Ok(CycleOutcome::UpToDate);
        };

        self.announce(&update)?;
        if !options.skip_confirmation && !(self.confirm)(&update) {
            tracing::info!(version = %update.version, "Update declined");
            return Ok(CycleOutcome::Declined(update));
        }

        writeln!(self.console, "Downloading update...")?;
        let archive = {
            let mut reporter =
                ProgressReporter::new(&mut self.console, self.config.progress_delay());
            self.repository
                .download(&update, &mut |progress| reporter.report(progress))?
        };
        writeln!(self.console, "\nDownloaded to: {}", archive.display())?;

        let extraction_dir = stage_archive(&archive, &self.config.extraction_dir().resolve())?;
        writeln!(self.console, "Extracting to: {}", extraction_dir.display())?;

        let app_root = locate_app_root(&extraction_dir, self.config.entry_point());
        writeln!(self.console, "App files in: {}", app_root.path.display())?;

        writeln!(self.console, "Preparing update files...")?;
        let staging_dir = self.config.staging_dir().resolve();
        let staged = stage_payload(&app_root.path, &staging_dir)?;

        self.print_banner()?;

        let status_file = self.config.status_file().resolve();
        if let Err(e) = InstallStatus::clear(&status_file) {
            tracing::warn!(error = %e, "Failed to remove stale install status: {:?}", status_file);
        }

        let script = InstallerScript::generate(&self.config, &update.version, &self.current);
        script.write()?;
        writeln!(self.console, "Starting install script: {}", script.path.display())?;

        if let Err(e) = (self.remove_extraction)(&extraction_dir) {
            tracing::warn!(error = %e, "Failed to remove extraction directory: {:?}", extraction_dir);
        }

        self.launcher
            .launch_detached(&script, &self.config.script_anchors())?;

        Ok(CycleOutcome::InstallerLaunched(Box::new(Handoff {
            update,
            paths: StagingPaths {
                archive,
                extraction_dir,
                app_root,
                staging_dir,
                install_dir: self.config.install_dir().resolve(),
            },
            staged,
            script,
        })))
    }

    fn announce(&mut self, update: &UpdateDescriptor) -> io::Result<()> {
        if update.custom.is_some() {
            writeln!(self.console, "changes in this update:")?;
            for change in update.changes() {
                writeln!(self.console, "\t- {change}")?;
            }
        }
        writeln!(self.console, "\nNew update available: {update}")
    }

    fn print_banner(&mut self) -> io::Result<()> {
        let rule = "=".repeat(BANNER_WIDTH);
        writeln!(self.console, "\n{rule}")?;
        writeln!(self.console, "Update downloaded and extracted.")?;
        writeln!(
            self.console,
            "The application will close to allow file replacement."
        )?;
        writeln!(
            self.console,
            "Please wait 10-15 seconds, then run the application again."
        )?;
        writeln!(self.console, "{rule}\n")
    }
}
