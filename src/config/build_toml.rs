//! build.toml configuration parsing
//!
//! The file is optional; every setting has a default matching the usual
//! repository layout.
//!
//! ```toml
//! [build]
//! solution = "Acme.sln"
//! source_dir = "src"
//! tests_dir = "tests"
//! output_dir = "output"
//! version_file = "Version.xml"
//! tag_file = "TagVersion"
//! nuget_server = "http://jenkins:8081/nuget"
//! nuget_symbol_server = "http://jenkins:8082/nuget"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::BuildError;
use crate::utils::paths::SETTINGS_FILE;

pub const DEFAULT_NUGET_SERVER: &str = "http://jenkins:8081/nuget";
pub const DEFAULT_NUGET_SYMBOL_SERVER: &str = "http://jenkins:8082/nuget";

/// Root of build.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildToml {
    #[serde(default)]
    pub build: BuildSection,
}

/// The `[build]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Solution file relative to the root; discovered when unset
    pub solution: Option<PathBuf>,

    /// Directory holding the packaged projects
    pub source_dir: PathBuf,

    /// Directory holding test projects
    pub tests_dir: PathBuf,

    /// Directory emptied by Clean
    pub output_dir: PathBuf,

    /// Version record
    pub version_file: PathBuf,

    /// Marker written by PrepareGitTag
    pub tag_file: PathBuf,

    /// Package feed URL
    pub nuget_server: String,

    /// Symbol package feed URL
    pub nuget_symbol_server: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            solution: None,
            source_dir: PathBuf::from("src"),
            tests_dir: PathBuf::from("tests"),
            output_dir: PathBuf::from("output"),
            version_file: PathBuf::from("Version.xml"),
            tag_file: PathBuf::from("TagVersion"),
            nuget_server: DEFAULT_NUGET_SERVER.to_string(),
            nuget_symbol_server: DEFAULT_NUGET_SYMBOL_SERVER.to_string(),
        }
    }
}

impl BuildToml {
    /// Load build.toml from `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SETTINGS_FILE);
        if !path.is_file() {
            tracing::debug!(root = %root.display(), "no build.toml, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse build.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let build = &self.build;
        let paths = [
            ("source_dir", &build.source_dir),
            ("tests_dir", &build.tests_dir),
            ("output_dir", &build.output_dir),
            ("version_file", &build.version_file),
            ("tag_file", &build.tag_file),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(BuildError::config_error(format!("[build] {} must not be empty", key)).into());
            }
            if path.is_absolute() {
                return Err(BuildError::config_error_with_hint(
                    format!("[build] {} must be relative to the build root", key),
                    format!("found {}", path.display()),
                )
                .into());
            }
        }

        for (key, url) in [
            ("nuget_server", &build.nuget_server),
            ("nuget_symbol_server", &build.nuget_symbol_server),
        ] {
            if url.trim().is_empty() {
                return Err(BuildError::config_error(format!("[build] {} must not be empty", key)).into());
            }
        }
        Ok(())
    }
}
