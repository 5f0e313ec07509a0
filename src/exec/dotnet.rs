//! dotnet CLI invocation for restore, build and package push

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::subprocess::run_command;
use crate::config::Configuration;
use crate::error::{hints, BuildError};

/// Runner for the `dotnet` executable
#[derive(Debug, Clone)]
pub struct DotNet {
    /// Resolved path of the dotnet executable
    program: PathBuf,

    /// Working directory for every invocation
    working_dir: PathBuf,
}

impl DotNet {
    /// Locate dotnet on PATH (or via `DOTNET_EXE`)
    pub fn locate(working_dir: &Path) -> Result<Self> {
        let program = match std::env::var_os("DOTNET_EXE").filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => which::which("dotnet")
                .map_err(|_| BuildError::missing_tool("dotnet", hints::dotnet()))?,
        };
        tracing::debug!(program = %program.display(), "using dotnet");

        Ok(Self {
            program,
            working_dir: working_dir.to_path_buf(),
        })
    }

    /// Use an explicit executable
    pub fn with_program(program: impl Into<PathBuf>, working_dir: &Path) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// `dotnet restore <solution>`
    pub fn restore(&self, solution: &Path) -> Result<()> {
        self.run("dotnet restore", restore_args(solution))
    }

    /// `dotnet build <solution> --configuration <cfg> --no-restore`
    pub fn build(&self, solution: &Path, configuration: Configuration) -> Result<()> {
        self.run("dotnet build", build_args(solution, configuration))
    }

    /// `dotnet nuget push <package> --source <feed> [--api-key <key>]`
    pub fn nuget_push(&self, package: &Path, source: &str, api_key: Option<&str>) -> Result<()> {
        self.run("dotnet nuget push", push_args(package, source, api_key))
            .with_context(|| format!("Failed to push {}", package.display()))
    }

    fn run(&self, tool: &str, args: Vec<OsString>) -> Result<()> {
        let result = run_command(&self.program, &args, &self.working_dir)?;
        if !result.success {
            return Err(BuildError::ToolFailed {
                tool: tool.to_string(),
                exit_code: result.exit_code,
            }
            .into());
        }
        Ok(())
    }
}

fn restore_args(solution: &Path) -> Vec<OsString> {
    vec!["restore".into(), solution.into()]
}

fn build_args(solution: &Path, configuration: Configuration) -> Vec<OsString> {
    vec![
        "build".into(),
        solution.into(),
        "--configuration".into(),
        configuration.to_string().into(),
        "--no-restore".into(),
    ]
}

fn push_args(package: &Path, source: &str, api_key: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "nuget".into(),
        "push".into(),
        package.into(),
        "--source".into(),
        source.into(),
    ];
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        args.push("--api-key".into());
        args.push(key.into());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_build_args() {
        let args = strings(build_args(Path::new("Acme.sln"), Configuration::Release));
        assert_eq!(args, vec!["build", "Acme.sln", "--configuration", "Release", "--no-restore"]);
        assert_eq!(strings(restore_args(Path::new("Acme.sln"))), vec!["restore", "Acme.sln"]);
    }

    #[test]
    fn test_push_args() {
        let args = strings(push_args(Path::new("a.1.0.nupkg"), "http://feed/nuget", None));
        assert_eq!(args, vec!["nuget", "push", "a.1.0.nupkg", "--source", "http://feed/nuget"]);

        let args = strings(push_args(Path::new("a.1.0.nupkg"), "http://feed/nuget", Some("k3y")));
        assert_eq!(&args[5..], ["--api-key", "k3y"]);

        let args = strings(push_args(Path::new("a.1.0.nupkg"), "http://feed/nuget", Some("")));
        assert_eq!(args.len(), 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_tool_failure() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dotnet = DotNet::with_program("false", temp_dir.path());

        let err = dotnet.restore(Path::new("Acme.sln")).unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::ToolFailed { tool, exit_code }) => {
                assert_eq!(tool, "dotnet restore");
                assert_eq!(*exit_code, 1);
            }
            other => panic!("expected tool failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_is_success() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dotnet = DotNet::with_program("true", temp_dir.path());
        dotnet.build(Path::new("Acme.sln"), Configuration::Debug).unwrap();
    }
}
