//! Windows batch rendering of the deferred installer.
//!
//! Uses labels and `goto` rather than parenthesised blocks so `%VAR%`
//! expansion happens line by line, and CRLF line endings so `cmd` label
//! lookup is reliable.

use crate::steps::script::InstallPlan;

/// `ping -n N` waits roughly `N - 1` seconds.
fn ping_count(seconds: u64) -> u64 {
    seconds + 1
}

fn status_line(plan: &InstallPlan, success: bool) -> String {
    let mut json = format!(
        r#"{{"success":{success},"version":"{}","previous_version":"{}","attempts":%ATTEMPT%"#,
        plan.version, plan.previous_version
    );
    if !success {
        json.push_str(r#","error":"copy failed after %ATTEMPT% attempts""#);
    }
    json.push('}');
    format!(r#"> "%STATUS%" echo {json}"#)
}

pub(crate) fn render(plan: &InstallPlan) -> String {
    let timing = &plan.timing;

    let mut lines = vec![
        "@echo off".to_string(),
        "setlocal".to_string(),
        format!(r#"set "STAGING={}""#, plan.staging_dir),
        format!(r#"set "INSTALL={}""#, plan.install_dir),
        format!(r#"set "STATUS={}""#, plan.status_file),
        format!(r#"set "STATUS_DIR={}""#, plan.status_dir),
        format!("set MAX_ATTEMPTS={}", timing.attempts.max(1)),
    ];
    // DELAY_n is the wait after failed attempt n.
    lines.extend(
        timing
            .retry_delays()
            .iter()
            .enumerate()
            .map(|(i, delay)| format!("set DELAY_{}={delay}", i + 1)),
    );
    lines.extend([
        "set ATTEMPT=0".to_string(),
        "echo Waiting for application to close...".to_string(),
        format!(
            "ping -n {} 127.0.0.1 >nul",
            ping_count(timing.initial_wait.as_secs())
        ),
        ":copy".to_string(),
        "set /a ATTEMPT+=1".to_string(),
        "echo Copying update files (attempt %ATTEMPT% of %MAX_ATTEMPTS%)...".to_string(),
        r#"xcopy "%STAGING%\*.*" "%INSTALL%\" /E /Y /I /H /R"#.to_string(),
        "if not errorlevel 1 goto success".to_string(),
        "if %ATTEMPT% GEQ %MAX_ATTEMPTS% goto failure".to_string(),
        "call set DELAY=%%DELAY_%ATTEMPT%%%".to_string(),
        "echo Files are still in use, retrying in %DELAY% seconds...".to_string(),
        "set /a PINGS=DELAY+1".to_string(),
        "ping -n %PINGS% 127.0.0.1 >nul".to_string(),
        "goto copy".to_string(),
        ":success".to_string(),
        "echo Update installed successfully.".to_string(),
        r#"if not exist "%STATUS_DIR%" mkdir "%STATUS_DIR%""#.to_string(),
        status_line(plan, true),
        "set EXIT_CODE=0".to_string(),
        "goto cleanup".to_string(),
        ":failure".to_string(),
        "echo Update failed with error.".to_string(),
        r#"if not exist "%STATUS_DIR%" mkdir "%STATUS_DIR%""#.to_string(),
        status_line(plan, false),
        "set EXIT_CODE=1".to_string(),
        ":cleanup".to_string(),
        "echo Cleaning up...".to_string(),
        r#"rd /s /q "%STAGING%" 2>nul"#.to_string(),
        "echo Done. Press any key to close...".to_string(),
        "pause >nul".to_string(),
        "exit /b %EXIT_CODE%".to_string(),
    ]);

    let mut script = lines.join("\r\n");
    script.push_str("\r\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallerTiming;

    fn plan() -> InstallPlan {
        InstallPlan {
            staging_dir: r"%LOCALAPPDATA%\Temp\upd".to_string(),
            install_dir: r"%LOCALAPPDATA%\Programs\my_app".to_string(),
            status_file: r"%LOCALAPPDATA%\my_app\update_status.json".to_string(),
            status_dir: r"%LOCALAPPDATA%\my_app".to_string(),
            version: "2.0.0".to_string(),
            previous_version: "1.0.0".to_string(),
            timing: InstallerTiming::default(),
        }
    }

    #[test]
    fn test_uses_crlf_and_ascii() {
        let script = render(&plan());
        assert!(script.is_ascii());
        assert!(script.starts_with("@echo off\r\n"));
        assert_eq!(script.matches('\n').count(), script.matches("\r\n").count());
    }

    #[test]
    fn test_copy_keeps_recursive_overwrite_flags() {
        let script = render(&plan());
        assert!(script.contains(r#"xcopy "%STAGING%\*.*" "%INSTALL%\" /E /Y /I /H /R"#));
        assert!(script.contains(r#"set "STAGING=%LOCALAPPDATA%\Temp\upd""#));
    }

    #[test]
    fn test_waits_and_backs_off() {
        let script = render(&plan());
        assert!(script.contains("ping -n 6 127.0.0.1 >nul"));
        assert!(script.contains("set MAX_ATTEMPTS=10\r\n"));
        assert!(script.contains("set DELAY_1=1\r\nset DELAY_2=2\r\nset DELAY_3=4\r\n"));
        assert!(script.contains("set DELAY_9=16\r\n"));
        assert!(!script.contains("DELAY_10"));
        assert!(script.contains("call set DELAY=%%DELAY_%ATTEMPT%%%\r\n"));
    }

    #[test]
    fn test_status_lines() {
        let plan = plan();
        assert_eq!(
            status_line(&plan, true),
            r#"> "%STATUS%" echo {"success":true,"version":"2.0.0","previous_version":"1.0.0","attempts":%ATTEMPT%}"#
        );
        assert!(status_line(&plan, false).contains(r#""error":"copy failed after %ATTEMPT% attempts""#));
    }

    #[test]
    fn test_cleanup_then_pause_then_exit_code() {
        let script = render(&plan());
        let cleanup = script.find(r#"rd /s /q "%STAGING%""#).unwrap();
        let pause = script.find("pause >nul").unwrap();
        let exit = script.find("exit /b %EXIT_CODE%").unwrap();
        assert!(cleanup < pause && pause < exit);
    }
}
