//! Writes the build version into project files and the version record

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::descriptor::ProjectDescriptor;
use super::xml;
use crate::version::BuildVersion;

/// Project properties that receive the build version
pub const VERSION_PROPERTIES: [&str; 3] = [
    "/Project/PropertyGroup/AssemblyVersion",
    "/Project/PropertyGroup/FileVersion",
    "/Project/PropertyGroup/Version",
];

/// Element holding the version in the version record
pub const VERSION_RECORD_PATH: &str = "/Version";

/// Stamp `version` into every project flagged for packaging
///
/// Returns the number of projects updated. Stops at the first failure;
/// projects already written stay written.
pub fn apply_version<'a, I>(projects: I, version: &BuildVersion) -> Result<usize>
where
    I: IntoIterator<Item = &'a ProjectDescriptor>,
{
    let mut updated = 0;
    for project in projects.into_iter().filter(|p| p.publish_package) {
        set_project_version(&project.path, version)
            .with_context(|| format!("Failed to set version of project '{}'", project.name))?;
        tracing::debug!(project = %project.name, %version, "stamped version");
        updated += 1;
    }
    Ok(updated)
}

/// Write `version` into the three version properties of one project file
pub fn set_project_version(project_file: &Path, version: &BuildVersion) -> Result<()> {
    for property in VERSION_PROPERTIES {
        xml::poke_file(project_file, property, version.as_str())?;
    }
    Ok(())
}

/// Read the previously recorded version
pub fn read_version_record(path: &Path) -> Result<String> {
    xml::peek_single_file(path, VERSION_RECORD_PATH)
        .with_context(|| format!("Failed to read version record {}", path.display()))
}

/// Persist `version` as the seed for the next build
pub fn write_version_record(path: &Path, version: &BuildVersion) -> Result<()> {
    xml::poke_file(path, VERSION_RECORD_PATH, version.as_str())
        .with_context(|| format!("Failed to write version record {}", path.display()))
}

/// Write the `TagVersion=<version>` marker consumed by tagging jobs
pub fn write_tag_file(path: &Path, version: &BuildVersion) -> Result<()> {
    fs::write(path, format!("TagVersion={}\n", version))
        .with_context(|| format!("Failed to write {}", path.display()))
}
