//! Synchronous subprocess execution

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Variables set by Visual Studio developer prompts that change how MSBuild
/// and the dotnet CLI behave; they are removed from every child process
pub const VISUAL_STUDIO_ENV_VARS: &[&str] = &[
    "DevEnvDir",
    "FrameworkDir",
    "FrameworkVersion",
    "MSBuildExtensionsPath",
    "MSBuildLoadMicrosoftTargetsReadOnly",
    "MSBuildSDKsPath",
    "VCINSTALLDIR",
    "VCToolsInstallDir",
    "VisualStudioVersion",
    "VSAPPIDDIR",
    "VSAPPIDNAME",
    "VSCMD_ARG_app_plat",
    "VSCMD_ARG_HOST_ARCH",
    "VSCMD_ARG_TGT_ARCH",
    "VSCMD_VER",
    "VSINSTALLDIR",
    "VSSDK150INSTALL",
];

/// Result of a subprocess execution
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code (-1 when killed by a signal)
    pub exit_code: i32,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, duration: Duration) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code().unwrap_or(-1),
            duration,
        }
    }
}

/// Run a command to completion in `cwd`
///
/// The child shares this process's stdin, stdout and stderr, so tool output
/// appears live in the terminal.
pub fn run_command<S: AsRef<OsStr>>(program: &Path, args: &[S], cwd: &Path) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for var in VISUAL_STUDIO_ENV_VARS {
        cmd.env_remove(var);
    }

    tracing::debug!(
        program = %program.display(),
        args = ?args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()).collect::<Vec<_>>(),
        cwd = %cwd.display(),
        "spawning process"
    );

    let status = cmd
        .status()
        .with_context(|| format!("Failed to execute {}", program.display()))?;
    let result = CommandResult::from_status(status, start.elapsed());

    tracing::debug!(
        program = %program.display(),
        exit_code = result.exit_code,
        duration = ?result.duration,
        "process exited"
    );
    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_reports_exit_code() {
        let cwd = std::env::temp_dir();
        let result = run_command(Path::new("sh"), &["-c", "exit 3"], &cwd).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, 3);

        let result = run_command(Path::new("sh"), &["-c", "exit 0"], &cwd).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_runs_in_working_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "").unwrap();

        let result = run_command(Path::new("sh"), &["-c", "test -f marker.txt"], temp_dir.path()).unwrap();
        assert!(result.success);
    }

    #[test]
    #[serial]
    fn test_visual_studio_variables_are_removed() {
        std::env::set_var("VSINSTALLDIR", "C:\\VS");
        std::env::set_var("SLNBUILD_KEPT", "yes");
        let cwd = std::env::temp_dir();
        let result = run_command(
            Path::new("sh"),
            &["-c", "test -z \"${VSINSTALLDIR:-}\" && test \"$SLNBUILD_KEPT\" = yes"],
            &cwd,
        )
        .unwrap();
        std::env::remove_var("VSINSTALLDIR");
        std::env::remove_var("SLNBUILD_KEPT");

        assert!(result.success);
    }

    #[test]
    fn test_missing_program() {
        let cwd = std::env::temp_dir();
        let err = run_command(Path::new("definitely-not-a-real-tool-7f3a"), &[] as &[&str], &cwd).unwrap_err();
        assert!(err.to_string().contains("Failed to execute"));
    }
}
