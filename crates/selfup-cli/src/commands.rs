//! Startup sequence: report the last install, run an update cycle, then the
//! application itself.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use selfup_updater::{
    CycleOutcome, GitHubRepository, InstallStatus, SystemLauncher, UpdateCycle, UpdateError,
    UpdaterConfig, Version, ensure_layout, exit_for_install,
};
use tracing::{info, info_span, warn};

use crate::cli::Cli;

/// Version of this build, compared against published releases.
pub fn current_version() -> Result<Version> {
    env!("CARGO_PKG_VERSION")
        .parse()
        .context("parse package version")
}

/// Runs one startup.
///
/// Returns only when no installer was launched; after a launch the process
/// exits from here.
pub fn run(cli: &Cli) -> Result<()> {
    let span = info_span!("startup", app = %cli.app_name);
    let _guard = span.enter();

    let config = UpdaterConfig::from_environment(&cli.app_name).context("build updater config")?;
    ensure_layout(&config).context("prepare application directories")?;
    report_last_install(&config);

    let current = current_version()?;
    let (owner, repo) = cli.repository_parts()?;
    let repository = GitHubRepository::new(owner, repo, current, config.target_dir().resolve())
        .context("create release client")?;
    let options = cli.cycle_options();

    let mut cycle = UpdateCycle::new(config, current, repository, SystemLauncher)
        .with_confirmation(|_| prompt_install(&mut io::stdin().lock(), &mut io::stdout()));
    match cycle.run(options).context("update cycle")? {
        CycleOutcome::InstallerLaunched(handoff) => {
            info!(version = %handoff.update.version, "Installer launched, exiting");
            exit_for_install(cycle.config().handoff_settle());
        }
        CycleOutcome::Declined(update) => {
            info!(version = %update.version, "Continuing with the installed version");
        }
        CycleOutcome::UpToDate => {}
    }

    println!("Starting {} {current}...", cli.app_name);
    println!("Doing what the app is supposed to do...");
    println!("Done.");
    Ok(())
}

/// Console text for a failed startup.
///
/// Updater failures lead with their user-facing message; the full context
/// chain follows as detail.
pub fn describe_failure(error: &anyhow::Error) -> String {
    match error.downcast_ref::<UpdateError>() {
        Some(update_error) => {
            let mut text = format!("error: {}", update_error.user_message());
            if update_error.is_retryable() {
                text.push_str(" The update will be retried on the next launch.");
            }
            text.push_str(&format!("\n  details: {error:#}"));
            text
        }
        None => format!("error: {error:#}"),
    }
}

/// Prints and consumes the result the deferred installer left behind.
fn report_last_install(config: &UpdaterConfig) {
    let path = config.status_file().resolve();
    match InstallStatus::take(&path) {
        Ok(Some(status)) => {
            info!(
                success = status.success,
                installed_at = ?status.written_at,
                "Read install status"
            );
            if !status.success {
                warn!(error = ?status.error, attempts = status.attempts, "Last update failed");
            }
            println!("{}", status.summary());
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Failed to read install status: {:?}", path),
    }
}

/// Asks whether to install; an empty answer means yes.
pub fn prompt_install(input: &mut impl BufRead, output: &mut impl Write) -> bool {
    if write!(output, "Install update? [y]/n: ")
        .and_then(|()| output.flush())
        .is_err()
    {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => accepts(&answer),
        Err(e) => {
            warn!(error = %e, "Failed to read confirmation");
            false
        }
    }
}

fn accepts(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}
