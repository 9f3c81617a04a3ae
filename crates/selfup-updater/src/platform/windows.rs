//! Detached installer launch on Windows.

use std::os::windows::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::PathAnchor;
use crate::error::{Result, UpdateError};

/// The `cmd` shim itself needs no console; `start` opens a new one for the script.
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs `cmd /C start "" script` so the batch file gets its own visible console.
pub fn spawn_detached(script: &Path, anchors: &[&PathAnchor]) -> Result<()> {
    let mut command = Command::new("cmd");
    command
        .args(["/C", "start", ""])
        .arg(script)
        .stdin(Stdio::null())
        .creation_flags(CREATE_NO_WINDOW);
    for anchor in anchors {
        command.env(anchor.var(), anchor.base());
    }

    let child = command
        .spawn()
        .map_err(|e| UpdateError::Handoff(format!("failed to start cmd: {e}")))?;
    tracing::info!(pid = child.id(), "Installer started: {:?}", script);
    Ok(())
}
