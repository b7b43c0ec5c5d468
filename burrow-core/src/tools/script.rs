//! Script execution tool: run a Python file as a subprocess with a
//! wall-clock timeout, capturing stdout, stderr, and the exit code.

use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

use crate::config::ToolSettings;
use crate::sandbox::SandboxRoot;
use crate::tools::ToolError;

/// Files must carry this suffix to be executable.
pub const SCRIPT_SUFFIX: &str = ".py";

/// Execute `file_path` with the configured interpreter and `args`.
///
/// The subprocess is bounded by `settings.script_timeout_secs`; on timeout
/// it is killed rather than left running.
pub async fn run_script(
    root: &SandboxRoot,
    file_path: &str,
    args: &[String],
    settings: &ToolSettings,
) -> Result<String, ToolError> {
    let path = root.resolve(file_path)?;

    let metadata = tokio::fs::metadata(path.as_path())
        .await
        .map_err(|_| ToolError::ScriptNotFound(file_path.to_string()))?;
    if !metadata.is_file() {
        return Err(ToolError::ScriptNotFound(file_path.to_string()));
    }

    // Suffix check happens before any subprocess is spawned.
    if !path.as_path().to_string_lossy().ends_with(SCRIPT_SUFFIX) {
        return Err(ToolError::NotAScript(file_path.to_string()));
    }

    let mut command = tokio::process::Command::new(&settings.script_interpreter);
    command
        .arg(path.as_path())
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(file_path, ?args, "running script");

    let timeout = Duration::from_secs(settings.script_timeout_secs);
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result?,
        // Dropping the in-flight future kills the child (kill_on_drop).
        Err(_) => {
            return Err(ToolError::Timeout {
                file: file_path.to_string(),
                secs: settings.script_timeout_secs,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if stdout.is_empty() && stderr.is_empty() {
        return Ok("No output produced".to_string());
    }

    let mut parts = vec![
        format!("STDOUT:\n{}", stdout.trim_end_matches('\n')),
        format!("STDERR:\n{}", stderr.trim_end_matches('\n')),
    ];
    if let Some(code) = output.status.code() {
        if code != 0 {
            parts.push(format!("Process exited with code {code}"));
        }
    }

    Ok(parts.join("\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = SandboxRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    fn write_script(dir: &tempfile::TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    #[tokio::test]
    async fn captures_stdout() {
        let (dir, root) = sandbox();
        write_script(&dir, "hello.py", "print('hello world')\n");

        let result = run_script(&root, "hello.py", &[], &ToolSettings::default())
            .await
            .unwrap();
        assert!(result.contains("STDOUT:\nhello world"), "got: {result}");
        assert!(!result.contains("exited with code"));
    }

    #[tokio::test]
    async fn forwards_arguments() {
        let (dir, root) = sandbox();
        write_script(&dir, "echo.py", "import sys\nprint(' '.join(sys.argv[1:]))\n");

        let args = vec!["alpha".to_string(), "beta".to_string()];
        let result = run_script(&root, "echo.py", &args, &ToolSettings::default())
            .await
            .unwrap();
        assert!(result.contains("alpha beta"), "got: {result}");
    }

    #[tokio::test]
    async fn reports_nonzero_exit_code() {
        let (dir, root) = sandbox();
        write_script(&dir, "fail.py", "import sys\nprint('before exit')\nsys.exit(3)\n");

        let result = run_script(&root, "fail.py", &[], &ToolSettings::default())
            .await
            .unwrap();
        assert!(result.contains("Process exited with code 3"), "got: {result}");
    }

    #[tokio::test]
    async fn silent_script_reports_no_output() {
        let (dir, root) = sandbox();
        write_script(&dir, "quiet.py", "pass\n");

        let result = run_script(&root, "quiet.py", &[], &ToolSettings::default())
            .await
            .unwrap();
        assert_eq!(result, "No output produced");
    }

    #[tokio::test]
    async fn wrong_suffix_rejected_without_spawning() {
        let (dir, root) = sandbox();
        write_script(&dir, "script.sh", "echo nope\n");

        let err = run_script(&root, "script.sh", &[], &ToolSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "\"script.sh\" is not a Python file.");
    }

    #[tokio::test]
    async fn missing_script_rejected() {
        let (_dir, root) = sandbox();
        let err = run_script(&root, "ghost.py", &[], &ToolSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File \"ghost.py\" not found.");
    }

    #[tokio::test]
    async fn outside_root_rejected() {
        let (_dir, root) = sandbox();
        let err = run_script(&root, "../evil.py", &[], &ToolSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Sandbox(_)));
    }

    #[tokio::test]
    async fn sleeping_script_times_out_and_is_killed() {
        let (dir, root) = sandbox();
        write_script(&dir, "sleep.py", "import time\ntime.sleep(30)\n");

        let settings = ToolSettings {
            script_timeout_secs: 1,
            ..Default::default()
        };
        let start = std::time::Instant::now();
        let err = run_script(&root, "sleep.py", &[], &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { secs: 1, .. }));
        assert!(err.to_string().contains("timed out after 1 seconds"));
        // the call returned promptly instead of hanging for the full sleep
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
