//! The solution build script
//!
//! Declares the build targets, their relations, and what each one does.
//!
//! ```text
//! Clean ──before──▶ Restore ──before──▶ Compile ──after──▶ UpdateVersion
//!                      ▲                   │
//!                      └──── depends_on ───┘
//! Publish       depends_on Clean, Restore, UpdateVersion, Compile
//! PrepareGitTag depends_on UpdateVersion
//! ```

pub mod clean;
pub mod publish;

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::{BuildSection, Configuration};
use crate::error::BuildError;
use crate::exec::DotNet;
use crate::project::{writer, Solution};
use crate::target::{Target, TargetGraph};
use crate::utils::terminal;
use crate::version::{compute_version_with, BuildVersion};

/// Target run when none is requested
pub const DEFAULT_TARGET: &str = "Compile";

/// The targets of the build script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Clean,
    Restore,
    Compile,
    UpdateVersion,
    Publish,
    PrepareGitTag,
}

/// Declare every target and its relations
pub fn target_graph() -> Result<TargetGraph<BuildTarget>, BuildError> {
    let mut graph = TargetGraph::new();

    graph.add(
        Target::new("Clean", BuildTarget::Clean)
            .description("Delete bin/obj directories and empty the output directory")
            .before(&["Restore"]),
    )?;
    graph.add(
        Target::new("Restore", BuildTarget::Restore)
            .description("Restore NuGet dependencies of the solution")
            .before(&["Compile"]),
    )?;
    graph.add(
        Target::new("Compile", BuildTarget::Compile)
            .description("Build the solution")
            .depends_on(&["Restore"])
            .after(&["UpdateVersion"]),
    )?;
    graph.add(
        Target::new("Publish", BuildTarget::Publish)
            .description("Push built packages to the package feed")
            .depends_on(&["Clean", "Restore", "UpdateVersion", "Compile"]),
    )?;
    graph.add(
        Target::new("PrepareGitTag", BuildTarget::PrepareGitTag)
            .description("Write the TagVersion marker for tagging jobs")
            .depends_on(&["UpdateVersion"]),
    )?;
    graph.add(
        Target::new("UpdateVersion", BuildTarget::UpdateVersion)
            .description("Compute the build version and stamp it into packaged projects"),
    )?;

    graph.validate()?;
    Ok(graph)
}

/// Resolved inputs of a build run
#[derive(Debug, Clone)]
pub struct BuildParameters {
    /// Build root; relative settings are resolved against it
    pub root: PathBuf,

    /// Settings from build.toml (or defaults)
    pub settings: BuildSection,

    pub configuration: Configuration,

    /// Explicit version; auto-increment when `None` or empty
    pub version_override: Option<String>,

    pub nuget_server: String,

    pub nuget_symbol_server: String,

    pub nuget_api_key: Option<String>,

    /// Also push symbol packages to the symbol feed
    pub push_symbols: bool,
}

/// Values produced by one target and read by later ones
///
/// Each value can be set once per run and is read-only afterwards.
#[derive(Debug, Default)]
pub struct BuildOutputs {
    version: OnceCell<BuildVersion>,
}

impl BuildOutputs {
    /// The version computed by UpdateVersion
    pub fn version(&self) -> Result<&BuildVersion, BuildError> {
        self.version.get().ok_or(BuildError::VersionNotComputed)
    }

    fn set_version(&self, version: BuildVersion) -> Result<&BuildVersion, BuildError> {
        self.version
            .set(version)
            .map_err(|_| BuildError::VersionAlreadyComputed)?;
        self.version()
    }
}

/// Executes target bodies against one build root
pub struct BuildScript {
    params: BuildParameters,
    solution: OnceCell<Solution>,
    dotnet: OnceCell<DotNet>,
}

impl BuildScript {
    pub fn new(params: BuildParameters) -> Self {
        Self {
            params,
            solution: OnceCell::new(),
            dotnet: OnceCell::new(),
        }
    }

    #[cfg(test)]
    fn with_dotnet(self, dotnet: DotNet) -> Self {
        let _ = self.dotnet.set(dotnet);
        self
    }

    /// Run one target body
    pub fn run_target(&self, target: BuildTarget, outputs: &BuildOutputs) -> Result<()> {
        match target {
            BuildTarget::Clean => self.clean(),
            BuildTarget::Restore => self.restore(),
            BuildTarget::Compile => self.compile(),
            BuildTarget::UpdateVersion => {
                let version = self.update_version()?;
                outputs.set_version(version)?;
                Ok(())
            }
            BuildTarget::Publish => self.publish(outputs.version()?),
            BuildTarget::PrepareGitTag => self.prepare_git_tag(outputs.version()?),
        }
    }

    fn path(&self, relative: &Path) -> PathBuf {
        self.params.root.join(relative)
    }

    fn solution(&self) -> Result<&Solution> {
        if let Some(solution) = self.solution.get() {
            return Ok(solution);
        }
        let path = crate::project::solution::find_solution(
            &self.params.root,
            self.params.settings.solution.as_deref(),
        )?;
        let solution = Solution::load(&path)?;
        Ok(self.solution.get_or_init(|| solution))
    }

    fn dotnet(&self) -> Result<&DotNet> {
        if let Some(dotnet) = self.dotnet.get() {
            return Ok(dotnet);
        }
        let dotnet = DotNet::locate(&self.params.root)?;
        Ok(self.dotnet.get_or_init(|| dotnet))
    }

    fn clean(&self) -> Result<()> {
        let settings = &self.params.settings;
        let dirs = [self.path(&settings.source_dir), self.path(&settings.tests_dir)];
        let output_dir = self.path(&settings.output_dir);

        let removed = clean::clean(&dirs, &output_dir)?;
        terminal::print_info(&format!(
            "Removed {} intermediate director{}, reset {}",
            removed.len(),
            if removed.len() == 1 { "y" } else { "ies" },
            settings.output_dir.display()
        ));
        Ok(())
    }

    fn restore(&self) -> Result<()> {
        let solution = self.solution()?;
        self.dotnet()?.restore(&solution.path)
    }

    fn compile(&self) -> Result<()> {
        let solution = self.solution()?;
        terminal::print_info(&format!("Configuration: {}", self.params.configuration));
        self.dotnet()?.build(&solution.path, self.params.configuration)
    }

    fn update_version(&self) -> Result<BuildVersion> {
        let record = self.path(&self.params.settings.version_file);

        // Validate before touching the solution so a bad override changes nothing
        let version = compute_version_with(self.params.version_override.as_deref(), || {
            writer::read_version_record(&record)
        })?;
        terminal::print_info(&format!("Build version: {}", version));

        let solution = self.solution()?;
        let updated = writer::apply_version(solution.packaging_projects(), &version)?;
        terminal::print_info(&format!(
            "Stamped {} of {} project(s)",
            updated,
            solution.projects.len()
        ));

        writer::write_version_record(&record, &version)?;
        Ok(version)
    }

    fn publish(&self, version: &BuildVersion) -> Result<()> {
        let source_dir = self.path(&self.params.settings.source_dir);
        let found = publish::find_packages(&source_dir, self.params.configuration)?;
        let set = publish::partition_packages(found);
        let api_key = self.params.nuget_api_key.as_deref();

        if set.packages.is_empty() {
            let pattern = publish::package_pattern(&source_dir, self.params.configuration);
            terminal::print_warning(&missing_packages_message(&pattern, set.symbol_packages.len()));
        } else {
            terminal::print_info(&format!(
                "Publishing {} package(s) for version {} to {}",
                set.packages.len(),
                version,
                self.params.nuget_server
            ));
            let dotnet = self.dotnet()?;
            let pushed = publish::push_packages(&set.packages, |package| {
                dotnet.nuget_push(package, &self.params.nuget_server, api_key)
            })?;
            terminal::print_success(&format!("Pushed {} package(s)", pushed));
        }

        if set.symbol_packages.is_empty() {
            return Ok(());
        }
        if !self.params.push_symbols {
            terminal::print_info(&format!(
                "Not pushing {} symbol package(s); pass --push-symbols to publish them",
                set.symbol_packages.len()
            ));
            return Ok(());
        }

        let dotnet = self.dotnet()?;
        let pushed = publish::push_packages(&set.symbol_packages, |package| {
            dotnet.nuget_push(package, &self.params.nuget_symbol_server, api_key)
        })?;
        terminal::print_success(&format!(
            "Pushed {} symbol package(s) to {}",
            pushed, self.params.nuget_symbol_server
        ));
        Ok(())
    }

    fn prepare_git_tag(&self, version: &BuildVersion) -> Result<()> {
        let tag_file = self.path(&self.params.settings.tag_file);
        writer::write_tag_file(&tag_file, version)?;
        terminal::print_info(&format!("Wrote {} ({})", tag_file.display(), version));
        Ok(())
    }
}

fn missing_packages_message(pattern: &str, symbol_count: usize) -> String {
    if symbol_count == 0 {
        format!("No packages found matching {}", pattern)
    } else {
        format!(
            "No ordinary packages found matching {} ({} symbol package(s) only)",
            pattern, symbol_count
        )
    }
}
