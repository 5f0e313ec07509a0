//! Error types and helpers for user-friendly error messages
//!
//! Configuration mistakes, document mismatches and tool failures get their own
//! variants so `main` can print an actionable hint next to the message.

use std::path::PathBuf;

use thiserror::Error;

/// Typed build failures with helpful context
#[derive(Error, Debug)]
pub enum BuildError {
    /// Explicit version override did not match `major.minor.build.revision`
    #[error("Invalid Version parameter specified: {version}")]
    InvalidVersion { version: String },

    /// Version record could not be parsed for auto-increment
    #[error("Malformed version source '{source_text}': {reason}")]
    MalformedVersionSource { source_text: String, reason: String },

    /// Targets depend on each other in a loop
    #[error("Dependency cycle detected: {}", .targets.join(" -> "))]
    DependencyCycle { targets: Vec<String> },

    /// A requested or referenced target is not registered
    #[error("Unknown target '{name}'{}", .referenced_by.as_ref().map(|r| format!(" (referenced by '{}')", r)).unwrap_or_default())]
    UnknownTarget {
        name: String,
        referenced_by: Option<String>,
        available: Vec<String>,
    },

    /// A target name was registered twice
    #[error("Target '{name}' is defined more than once")]
    DuplicateTarget { name: String },

    /// Build settings are inconsistent
    #[error("Configuration error: {message}")]
    Config { message: String, hint: Option<String> },

    /// An element path did not match exactly one element
    #[error("Expected exactly one element at '{path}' in {}, found {found}", .file.display())]
    XmlPath {
        path: String,
        file: PathBuf,
        found: usize,
    },

    /// Tool/executable not found
    #[error("Missing tool: {tool}")]
    MissingTool { tool: String, hint: String },

    /// External process returned a non-zero exit code
    #[error("{tool} exited with code {exit_code}")]
    ToolFailed { tool: String, exit_code: i32 },

    /// A target needed the build version before UpdateVersion produced it
    #[error("Build version has not been computed; run UpdateVersion first")]
    VersionNotComputed,

    /// UpdateVersion produced a version twice in one run
    #[error("Build version was already computed for this run")]
    VersionAlreadyComputed,
}

impl BuildError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a configuration error with a hint
    pub fn config_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Hint shown under the error, if any
    pub fn hint(&self) -> Option<String> {
        match self {
            BuildError::InvalidVersion { .. } => Some(hints::version_format().to_string()),
            BuildError::MalformedVersionSource { .. } => {
                Some(hints::version_record().to_string())
            }
            BuildError::DependencyCycle { .. } => {
                Some("Remove one of the DependsOn/Before/After relations in the loop.".to_string())
            }
            BuildError::UnknownTarget { available, .. } if !available.is_empty() => {
                Some(format!("Available targets: {}", available.join(", ")))
            }
            BuildError::Config { hint, .. } => hint.clone(),
            BuildError::MissingTool { hint, .. } => Some(hint.clone()),
            BuildError::VersionNotComputed => {
                Some("Declare UpdateVersion as a dependency of this target.".to_string())
            }
            _ => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        if let Some(hint) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
        }

        eprintln!();
    }
}

/// Print any error, using hints when the chain carries a [`BuildError`]
pub fn display_error(err: &anyhow::Error) {
    use console::style;

    if let Some(build_err) = err.chain().find_map(|e| e.downcast_ref::<BuildError>()) {
        // Context layers above the typed error still need to be shown
        for outer in err.chain().take_while(|e| e.downcast_ref::<BuildError>().is_none()) {
            eprintln!("{} {}", style("context:").dim(), outer);
        }
        build_err.display_with_hints();
        return;
    }

    eprintln!("\n{} {:#}\n", style("ERROR:").red().bold(), err);
}

/// Common error hints
pub mod hints {
    /// Hint for the version override format
    pub fn version_format() -> &'static str {
        "Versions must have four numeric components, e.g. --version 1.4.12.0"
    }

    /// Hint for an unreadable version record
    pub fn version_record() -> &'static str {
        "Version.xml must contain a single element like <Version>1.4.12.0</Version>.\n\
         Fix the file or pass an explicit --version."
    }

    /// Hint for missing dotnet
    pub fn dotnet() -> &'static str {
        "Install the .NET SDK from https://dotnet.microsoft.com/download or use your package manager:\n\
         • macOS: brew install --cask dotnet-sdk\n\
         • Ubuntu: sudo apt install dotnet-sdk-8.0\n\
         • Windows: winget install Microsoft.DotNet.SDK.8"
    }

    /// Hint for solution discovery failures
    pub fn solution_not_found() -> &'static str {
        "Set `solution = \"MySolution.sln\"` under [build] in build.toml,\n\
         or run from a directory containing exactly one .sln file."
    }

    /// Hint for projects missing from a solution configuration
    pub fn project_configuration() -> &'static str {
        "Open the solution in Visual Studio or Rider and tick the project under\n\
         Configuration Manager for every solution configuration, then save the .sln."
    }
}
