//! End-to-end tests for the slnbuild binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SLN: &str = r#"Microsoft Visual Studio Solution File, Format Version 12.00
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "docs", "docs", "{1B4E3E1A-0000-4000-8000-000000000001}"
EndProject
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Acme.Core", "src\Acme.Core\Acme.Core.csproj", "{1B4E3E1A-0000-4000-8000-000000000002}"
EndProject
"#;

const CSPROJ: &str = "<Project Sdk=\"Microsoft.NET.Sdk\">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <AssemblyVersion>1.2.3.0</AssemblyVersion>
    <FileVersion>1.2.3.0</FileVersion>
    <Version>1.2.3.0</Version>
    <__PublishPackage>true</__PublishPackage>
  </PropertyGroup>
</Project>
";

/// Command for the slnbuild binary with build settings cleared from the environment
fn slnbuild() -> Command {
    let mut cmd = Command::cargo_bin("slnbuild").unwrap();
    for var in [
        "BUILD_CONFIGURATION",
        "BUILD_VERSION",
        "NUGET_SERVER",
        "NUGET_SYMBOL_SERVER",
        "NUGET_API_KEY",
        "DOTNET_EXE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--no-color");
    cmd
}

fn solution_fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/Acme.Core")).unwrap();
    fs::write(root.join("Acme.sln"), SLN).unwrap();
    fs::write(root.join("src/Acme.Core/Acme.Core.csproj"), CSPROJ).unwrap();
    fs::write(root.join("Version.xml"), "<Version>1.2.3.0</Version>\n").unwrap();
    temp_dir
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_help() {
    slnbuild()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--push-symbols"));
}

#[test]
fn test_list_targets() {
    slnbuild()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compile"))
        .stdout(predicate::str::contains("(default)"))
        .stdout(predicate::str::contains("PrepareGitTag"));
}

#[test]
fn test_plan_publish() {
    slnbuild()
        .args(["Publish", "--plan"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"(?s)1\. Clean.*2\. Restore.*3\. UpdateVersion.*4\. Compile.*5\. Publish",
        )
        .unwrap());
}

#[test]
fn test_plan_marks_skipped_targets() {
    slnbuild()
        .args(["publish", "--plan", "--skip", "clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Clean (skipped)"));
}

#[test]
fn test_unknown_target() {
    slnbuild()
        .arg("Deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Deploy"))
        .stderr(predicate::str::contains("Available targets"));
}

#[test]
fn test_unknown_skip_target() {
    slnbuild()
        .args(["Compile", "--plan", "--skip", "Lint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Lint"));
}

#[test]
fn test_invalid_version_override() {
    let temp_dir = solution_fixture();
    let root = temp_dir.path();

    slnbuild()
        .args(["UpdateVersion", "--version", "1.2.x.0", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Version parameter specified: 1.2.x.0"));

    assert_eq!(read(&root.join("src/Acme.Core/Acme.Core.csproj")), CSPROJ);
    assert_eq!(read(&root.join("Version.xml")), "<Version>1.2.3.0</Version>\n");
}

#[test]
fn test_prepare_git_tag_increments_version() {
    let temp_dir = solution_fixture();
    let root = temp_dir.path();

    slnbuild()
        .args(["PrepareGitTag", "--root"])
        .arg(root)
        .assert()
        .success();

    assert_eq!(read(&root.join("TagVersion")), "TagVersion=1.2.4.0\n");
    assert_eq!(read(&root.join("Version.xml")), "<Version>1.2.4.0</Version>\n");
    assert_eq!(
        read(&root.join("src/Acme.Core/Acme.Core.csproj")),
        CSPROJ.replace("1.2.3.0", "1.2.4.0")
    );
}

#[test]
fn test_version_from_environment() {
    let temp_dir = solution_fixture();
    let root = temp_dir.path();

    slnbuild()
        .env("BUILD_VERSION", "3.0.0.7")
        .args(["PrepareGitTag", "--root"])
        .arg(root)
        .assert()
        .success();

    assert_eq!(read(&root.join("TagVersion")), "TagVersion=3.0.0.7\n");
    assert_eq!(read(&root.join("Version.xml")), "<Version>3.0.0.7</Version>\n");
}

#[test]
fn test_skipped_dependency_leaves_version_unset() {
    let temp_dir = solution_fixture();
    let root = temp_dir.path();

    slnbuild()
        .args(["PrepareGitTag", "--skip", "UpdateVersion", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Build version has not been computed"));

    assert!(!root.join("TagVersion").exists());
}

#[test]
fn test_malformed_settings() {
    let temp_dir = solution_fixture();
    let root = temp_dir.path();
    fs::write(root.join("build.toml"), "[build]\nunknown_key = 1\n").unwrap();

    slnbuild()
        .args(["UpdateVersion", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("build.toml"));
}
