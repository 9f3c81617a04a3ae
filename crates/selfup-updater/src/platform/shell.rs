//! POSIX `sh` rendering of the deferred installer.

use crate::steps::script::InstallPlan;

fn status_command(plan: &InstallPlan, success: bool) -> String {
    let format = if success {
        r#"{"success":true,"version":"%s","previous_version":"%s","attempts":%d}\n"#
    } else {
        r#"{"success":false,"version":"%s","previous_version":"%s","attempts":%d,"error":"copy failed after %d attempts"}\n"#
    };
    let attempts = if success {
        r#""$ATTEMPT""#
    } else {
        r#""$ATTEMPT" "$ATTEMPT""#
    };
    format!(
        r#"printf '{format}' "{}" "{}" {attempts} > "$STATUS""#,
        plan.version, plan.previous_version
    )
}

pub(crate) fn render(plan: &InstallPlan) -> String {
    let timing = &plan.timing;
    let delays = timing
        .retry_delays()
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"#!/bin/sh
STAGING="{staging}"
INSTALL="{install}"
STATUS="{status}"
STATUS_DIR="{status_dir}"
MAX_ATTEMPTS={attempts}
ATTEMPT=0
RESULT=1

echo "Waiting for application to close..."
sleep {initial_wait}

# Wait after each failed attempt, in order.
set -- {delays}
while :; do
    ATTEMPT=$((ATTEMPT + 1))
    echo "Copying update files (attempt $ATTEMPT of $MAX_ATTEMPTS)..."
    if mkdir -p "$INSTALL" && cp -Rpf "$STAGING/." "$INSTALL/"; then
        RESULT=0
        break
    fi
    if [ "$ATTEMPT" -ge "$MAX_ATTEMPTS" ]; then
        break
    fi
    DELAY=$1
    shift
    echo "Files are still in use, retrying in $DELAY seconds..."
    sleep "$DELAY"
done

mkdir -p "$STATUS_DIR"
if [ "$RESULT" -eq 0 ]; then
    echo "Update installed successfully."
    {success_status}
else
    echo "Update failed with error."
    {failure_status}
fi

echo "Cleaning up..."
rm -rf "$STAGING"

if [ -t 0 ]; then
    echo "Done. Press Enter to close..."
    read -r _
else
    echo "Done."
fi
exit "$RESULT"
"#,
        staging = plan.staging_dir,
        install = plan.install_dir,
        status = plan.status_file,
        status_dir = plan.status_dir,
        attempts = timing.attempts.max(1),
        initial_wait = timing.initial_wait.as_secs(),
        success_status = status_command(plan, true),
        failure_status = status_command(plan, false),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallerTiming;

    fn plan() -> InstallPlan {
        InstallPlan {
            staging_dir: "$HOME/.cache/my_app/upd".to_string(),
            install_dir: "$HOME/.local/opt/my_app".to_string(),
            status_file: "$HOME/.local/share/my_app/update_status.json".to_string(),
            status_dir: "$HOME/.local/share/my_app".to_string(),
            version: "2.0.0".to_string(),
            previous_version: "1.0.0".to_string(),
            timing: InstallerTiming::default(),
        }
    }

    #[test]
    fn test_paths_are_quoted_variable_references() {
        let script = render(&plan());
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains(r#"STAGING="$HOME/.cache/my_app/upd""#));
        assert!(script.contains(r#"INSTALL="$HOME/.local/opt/my_app""#));
        assert!(script.is_ascii());
    }

    #[test]
    fn test_retry_loop_parameters() {
        let script = render(&plan());
        assert!(script.contains("MAX_ATTEMPTS=10"));
        assert!(script.contains("sleep 5\n"));
        assert!(script.contains("set -- 1 2 4 8 16 16 16 16 16\n"));
        assert!(script.contains("    DELAY=$1\n    shift\n"));
    }

    #[test]
    fn test_pause_only_on_terminal() {
        let script = render(&plan());
        let guard = script.find("if [ -t 0 ]; then").unwrap();
        let read = script.find("read -r _").unwrap();
        assert!(guard < read);
        assert!(script.trim_end().ends_with(r#"exit "$RESULT""#));
    }

    #[test]
    fn test_failure_status_reports_attempts() {
        let command = status_command(&plan(), false);
        assert!(command.contains(r#""error":"copy failed after %d attempts""#));
        assert!(command.ends_with(r#""$ATTEMPT" "$ATTEMPT" > "$STATUS""#));
    }
}
