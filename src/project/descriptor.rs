//! Project descriptors loaded from MSBuild project files

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::xml;
use crate::error::BuildError;

/// Property that opts a project into packaging and version stamping
pub const PUBLISH_PACKAGE_PROPERTY: &str = "__PublishPackage";

/// A project referenced by the solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Project name from the solution file
    pub name: String,

    /// Path to the project file
    pub path: PathBuf,

    /// Whether the project produces a package for publishing
    pub publish_package: bool,
}

impl ProjectDescriptor {
    /// Read a project file and record its packaging flag
    ///
    /// Only properties written directly in the file are seen; imported props
    /// files and conditions are not evaluated. A missing property means the
    /// project is not packaged.
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project {}", path.display()))?;
        let publish_package = parse_publish_flag(&content)
            .with_context(|| format!("Invalid project file {}", path.display()))?;

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            publish_package,
        })
    }
}

/// Packaging flag from project file content; the last definition wins
fn parse_publish_flag(content: &str) -> Result<bool> {
    let path = format!("/Project/PropertyGroup/{}", PUBLISH_PACKAGE_PROPERTY);
    let values = xml::peek(content, &path)?;

    match values.last().map(String::as_str) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
        Some(v) => Err(BuildError::config_error(format!(
            "{} must be 'true' or 'false', found '{}'",
            PUBLISH_PACKAGE_PROPERTY, v
        ))
        .into()),
    }
}
