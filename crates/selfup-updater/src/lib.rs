//! Deferred self-install for a self-updating desktop application.
//!
//! A running executable cannot overwrite its own installation while the
//! operating system holds locks on its files. This crate stages a downloaded
//! update next to the installation, writes a small installer script that waits
//! for the application to exit and copies the staged files over, launches that
//! script as a detached process and lets the application terminate.
//!
//! # Flow
//!
//! 1. [`UpdateRepository::check_for_updates`] finds a newer release
//! 2. [`UpdateRepository::download`] fetches and verifies the archive,
//!    reporting progress through [`steps::progress::ProgressReporter`]
//! 3. [`steps::extract::stage_archive`] unpacks it into a scratch directory
//! 4. [`steps::locate::locate_app_root`] finds the application inside it
//! 5. [`steps::stage::stage_payload`] copies the application to the staging directory
//! 6. [`steps::script::InstallerScript`] renders and writes the installer
//! 7. [`steps::handoff::Launcher`] starts it and
//!    [`steps::handoff::exit_for_install`] ends the process
//!
//! [`UpdateCycle`] runs steps 1 to 7 except the final exit, which the caller
//! performs once it has nothing left to flush.
//!
//! # Example
//!
//! ```ignore
//! use selfup_updater::{
//!     CycleOptions, CycleOutcome, GitHubRepository, SystemLauncher, UpdateCycle, UpdaterConfig,
//! };
//!
//! let config = UpdaterConfig::from_environment("my_app")?;
//! let current = "1.0.0".parse()?;
//! let repository = GitHubRepository::new("owner", "my_app", current, config.target_dir().resolve())?;
//! let mut cycle = UpdateCycle::new(config, current, repository, SystemLauncher);
//!
//! if let CycleOutcome::InstallerLaunched(_) = cycle.run(CycleOptions::default())? {
//!     selfup_updater::exit_for_install(cycle.config().handoff_settle());
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod cycle;
pub mod error;
pub mod github;
pub mod platform;
pub mod repository;
pub mod status;
pub mod steps;
pub mod verify;
pub mod version;

// Re-exports for convenience
pub use bootstrap::ensure_layout;
pub use config::{AnchoredPath, InstallerTiming, PathAnchor, UpdateChannel, UpdaterConfig};
pub use cycle::{CycleOptions, CycleOutcome, Handoff, StagingPaths, UpdateCycle};
pub use error::{Result, UpdateError};
pub use github::GitHubRepository;
pub use platform::ScriptDialect;
pub use repository::{UpdateDescriptor, UpdateRepository};
pub use status::InstallStatus;
pub use steps::handoff::{Launcher, SystemLauncher, exit_for_install};
pub use steps::progress::{DownloadProgress, ProgressReporter};
pub use version::{PreRelease, Version};
