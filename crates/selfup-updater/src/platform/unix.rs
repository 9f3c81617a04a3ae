//! Detached installer launch on Unix.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::PathAnchor;
use crate::error::{Result, UpdateError};

/// Starts `/bin/sh script` in its own process group without waiting for it.
///
/// stdin is detached so the script skips its interactive pause; stdout and
/// stderr stay on the current terminal so the user sees the outcome.
pub fn spawn_detached(script: &Path, anchors: &[&PathAnchor]) -> Result<()> {
    let mut command = Command::new("/bin/sh");
    command
        .arg(script)
        .stdin(Stdio::null())
        .process_group(0);
    for anchor in anchors {
        command.env(anchor.var(), anchor.base());
    }

    let child = command
        .spawn()
        .map_err(|e| UpdateError::Handoff(format!("failed to start /bin/sh: {e}")))?;
    tracing::info!(pid = child.id(), "Installer started: {:?}", script);
    Ok(())
}
