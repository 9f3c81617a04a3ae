//! Handing control to the deferred installer and exiting.

use std::io::Write;
use std::time::Duration;

use crate::config::PathAnchor;
use crate::error::Result;
use crate::platform;
use crate::steps::script::InstallerScript;

/// Starts the installer script as an independent process.
pub trait Launcher {
    /// Starts `script` without waiting for it, exporting `anchors` to its
    /// environment.
    fn launch_detached(&self, script: &InstallerScript, anchors: &[&PathAnchor]) -> Result<()>;
}

/// Launches through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch_detached(&self, script: &InstallerScript, anchors: &[&PathAnchor]) -> Result<()> {
        tracing::info!("Starting install script: {:?}", script.path);
        platform::spawn_detached(&script.path, anchors)
    }
}

/// Releases the application's file locks by terminating the process.
///
/// Flushes pending console output, gives the installer `settle` to start,
/// prints a notice and exits with status 0.
pub fn exit_for_install(settle: Duration) -> ! {
    let _ = std::io::stdout().flush();
    std::thread::sleep(settle);
    println!("Exiting application for update...");
    let _ = std::io::stdout().flush();
    std::process::exit(0);
}
