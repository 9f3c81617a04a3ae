//! Platform-specific installer dialects and process launching.
//!
//! Both script dialects are available everywhere so they can be rendered and
//! inspected on any host; spawning is split by target:
//! - **Windows**: batch script started through `cmd /C start` in its own console
//! - **Unix**: POSIX `sh` script in its own process group

mod batch;
mod shell;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::spawn_detached;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::spawn_detached;

use std::fmt;

use crate::steps::script::InstallPlan;

/// Script language of the deferred installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptDialect {
    /// Windows `cmd.exe` batch file.
    Batch,
    /// POSIX `sh` script.
    Shell,
}

impl ScriptDialect {
    /// Dialect of the platform this binary was built for.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(windows) { Self::Batch } else { Self::Shell }
    }

    /// File extension of the script, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Batch => "bat",
            Self::Shell => "sh",
        }
    }

    /// Renders the installer for `plan` in this dialect.
    #[must_use]
    pub fn render(self, plan: &InstallPlan) -> String {
        match self {
            Self::Batch => batch::render(plan),
            Self::Shell => shell::render(plan),
        }
    }
}

impl fmt::Display for ScriptDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => write!(f, "batch"),
            Self::Shell => write!(f, "sh"),
        }
    }
}
