//! Command-line shell for the self-updating application.

pub mod cli;
pub mod commands;
pub mod logging;
