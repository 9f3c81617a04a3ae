//! CLI argument definitions for the self-updating application.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use selfup_updater::{CycleOptions, UpdateChannel};
use tracing::level_filters::LevelFilter;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "selfup",
    version,
    about = "Check for updates, install them on exit, then run the application",
    long_about = "Check for a newer release, stage it and hand installation over to a\n\
                  deferred installer that replaces the files once this process has exited.\n\n\
                  Tokens: `a`, `b` or `rc` follow that pre-release channel; `skip` installs\n\
                  without asking for confirmation."
)]
pub struct Cli {
    /// Channel (`a`, `b`, `rc`) and confirmation (`skip`) tokens.
    #[arg(value_name = "TOKEN")]
    pub tokens: Vec<String>,

    /// Application name used for the install, data and staging directories.
    #[arg(long = "app-name", value_name = "NAME", default_value = "my_app")]
    pub app_name: String,

    /// GitHub repository publishing the releases.
    #[arg(long = "repository", value_name = "OWNER/REPO", default_value = "selfup/my_app")]
    pub repository: String,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Interprets the positional tokens.
    ///
    /// `a`, `b` and `rc` select the pre-release channel (the last one wins).
    /// Any other token sets skip-confirmation to whether it equals `skip`, so
    /// only the last such token counts.
    #[must_use]
    pub fn cycle_options(&self) -> CycleOptions {
        self.tokens
            .iter()
            .fold(CycleOptions::default(), |mut options, token| {
                match UpdateChannel::from_token(token) {
                    Some(channel) => options.channel = channel,
                    None => options.skip_confirmation = token == "skip",
                }
                options
            })
    }

    /// Splits `--repository` into owner and name.
    pub fn repository_parts(&self) -> anyhow::Result<(&str, &str)> {
        match self.repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok((owner, repo))
            }
            _ => anyhow::bail!(
                "invalid repository {:?}, expected OWNER/REPO",
                self.repository
            ),
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
