//! Visual Studio solution file parsing
//!
//! Only the `Project(...) = "Name", "path", "{guid}"` entries and the
//! configuration tables in the `Global` block matter here; solution folders
//! and non-project items are skipped.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use super::descriptor::ProjectDescriptor;
use crate::error::{hints, BuildError};
use crate::utils::paths::normalize_separators;

/// Project type GUID used for solution folders
const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

fn project_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"^Project\("\{(?P<type>[0-9A-Fa-f-]+)\}"\)\s*=\s*"(?P<name>[^"]*)"\s*,\s*"(?P<path>[^"]*)"\s*,\s*"\{(?P<guid>[0-9A-Fa-f-]+)\}"\s*$"#,
        )
        .expect("static regex")
    })
}

fn project_configuration_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\{(?P<guid>[0-9A-Fa-f-]+)\}\.(?P<config>.+)\.ActiveCfg\s*=")
            .expect("static regex")
    })
}

/// A project entry as written in the solution file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    pub name: String,
    /// Project GUID, upper-case, without braces
    pub guid: String,
    /// Path relative to the solution directory, native separators
    pub relative_path: PathBuf,
}

/// A loaded solution and its projects
#[derive(Debug, Clone)]
pub struct Solution {
    /// Path to the `.sln` file
    pub path: PathBuf,

    /// Every project in the solution, in file order
    pub projects: Vec<ProjectDescriptor>,
}

/// Parse project entries from solution file content
pub fn parse_entries(content: &str) -> Vec<SolutionEntry> {
    content
        .lines()
        .filter_map(|line| project_line().captures(line.trim()))
        .filter(|caps| !caps["type"].eq_ignore_ascii_case(SOLUTION_FOLDER_TYPE))
        .filter(|caps| caps["path"].to_ascii_lowercase().ends_with("proj"))
        .map(|caps| SolutionEntry {
            name: caps["name"].to_string(),
            guid: caps["guid"].to_ascii_uppercase(),
            relative_path: normalize_separators(&caps["path"]),
        })
        .collect()
}

/// Configuration tables from the solution's `Global` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionConfigurations {
    /// `SolutionConfigurationPlatforms` entries such as `Release|Any CPU`
    pub solution: Vec<String>,

    /// `(project guid, solution configuration)` pairs with an `ActiveCfg` mapping
    pub project: HashSet<(String, String)>,
}

/// Parse the solution and project configuration tables
pub fn parse_configurations(content: &str) -> SolutionConfigurations {
    let mut configurations = SolutionConfigurations::default();
    let mut section: Option<String> = None;

    for line in content.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("GlobalSection(") {
            section = rest.split_once(')').map(|(name, _)| name.to_string());
            continue;
        }
        if line == "EndGlobalSection" {
            section = None;
            continue;
        }

        match section.as_deref() {
            Some("SolutionConfigurationPlatforms") => {
                if let Some((config, _)) = line.split_once('=') {
                    configurations.solution.push(config.trim().to_string());
                }
            }
            Some("ProjectConfigurationPlatforms") => {
                if let Some(caps) = project_configuration_line().captures(line) {
                    configurations
                        .project
                        .insert((caps["guid"].to_ascii_uppercase(), caps["config"].to_string()));
                }
            }
            _ => {}
        }
    }

    configurations
}

/// Every project must map every solution configuration to a project configuration
///
/// A project missing from a configuration would silently not be built in it.
pub fn check_project_configurations(
    entries: &[SolutionEntry],
    configurations: &SolutionConfigurations,
) -> Result<(), BuildError> {
    for entry in entries {
        for config in &configurations.solution {
            let key = (entry.guid.clone(), config.clone());
            if !configurations.project.contains(&key) {
                return Err(BuildError::config_error_with_hint(
                    format!(
                        "Project '{}' has no build configuration for solution configuration '{}'",
                        entry.name, config
                    ),
                    hints::project_configuration(),
                ));
            }
        }
    }
    Ok(())
}

impl Solution {
    /// Load a solution and every project it references
    ///
    /// Fails when a project lacks a mapping for one of the solution's
    /// configurations.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read solution {}", path.display()))?;
        let solution_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let entries = parse_entries(&content);
        check_project_configurations(&entries, &parse_configurations(&content))
            .with_context(|| format!("Invalid solution {}", path.display()))?;

        let mut projects = Vec::new();
        for entry in entries {
            let project_path = solution_dir.join(&entry.relative_path);
            let descriptor = ProjectDescriptor::load(&entry.name, &project_path)
                .with_context(|| format!("Failed to load project '{}'", entry.name))?;
            projects.push(descriptor);
        }

        tracing::debug!(solution = %path.display(), projects = projects.len(), "loaded solution");
        Ok(Self {
            path: path.to_path_buf(),
            projects,
        })
    }

    /// Projects flagged for packaging
    pub fn packaging_projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.projects.iter().filter(|p| p.publish_package)
    }
}

/// Locate the solution file for a build root
///
/// An explicitly configured path wins; otherwise the root must contain
/// exactly one `.sln` file.
pub fn find_solution(root: &Path, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(configured) = configured {
        let path = root.join(configured);
        if !path.is_file() {
            return Err(BuildError::config_error_with_hint(
                format!("Solution file not found: {}", path.display()),
                hints::solution_not_found(),
            )
            .into());
        }
        return Ok(path);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("Failed to read directory: {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("sln")))
        .collect();
    candidates.sort();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(BuildError::config_error_with_hint(
            format!("No solution file found in {}", root.display()),
            hints::solution_not_found(),
        )
        .into()),
        n => Err(BuildError::config_error_with_hint(
            format!("Found {} solution files in {}", n, root.display()),
            hints::solution_not_found(),
        )
        .into()),
    }
}
