//! CLI argument parsing using clap derive macros

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use crate::build::{self, BuildOutputs, BuildParameters, BuildScript, BuildTarget, DEFAULT_TARGET};
use crate::config::{BuildToml, Configuration};
use crate::error::BuildError;
use crate::target::{self, Target, TargetGraph};
use crate::utils::paths::find_build_root;

/// slnbuild - build script runner for .NET solutions
///
/// Runs a target and everything it depends on: restore, compile, version
/// stamping, package publishing and tag preparation.
#[derive(Parser, Debug)]
#[command(name = "slnbuild")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Target to run
    #[arg(default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Configuration to build [default: Release on a build server, Debug otherwise]
    #[arg(long, value_enum, ignore_case = true, env = "BUILD_CONFIGURATION")]
    pub configuration: Option<Configuration>,

    /// Explicit build version (a.b.c.d); auto-incremented from Version.xml when omitted
    #[arg(long = "version", env = "BUILD_VERSION")]
    pub version_override: Option<String>,

    /// Package feed receiving ordinary packages
    #[arg(long, env = "NUGET_SERVER")]
    pub nuget_server: Option<String>,

    /// Package feed receiving symbol packages
    #[arg(long, env = "NUGET_SYMBOL_SERVER")]
    pub nuget_symbol_server: Option<String>,

    /// API key for package pushes
    #[arg(long, env = "NUGET_API_KEY", hide_env_values = true)]
    pub nuget_api_key: Option<String>,

    /// Also push symbol packages to the symbol feed
    #[arg(long)]
    pub push_symbols: bool,

    /// Build root [default: nearest directory with build.toml or .nuke]
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Targets to leave out of the run (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Print the execution plan without running it
    #[arg(long)]
    pub plan: bool,

    /// List available targets
    #[arg(long)]
    pub list: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Execute the requested target
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        let graph = build::target_graph()?;

        if self.list {
            print_targets(&graph);
            return Ok(());
        }

        let plan = graph.resolve(&self.target)?;
        for name in &self.skip {
            if graph.get(name).is_none() {
                return Err(BuildError::UnknownTarget {
                    name: name.clone(),
                    referenced_by: None,
                    available: graph.names(),
                }
                .into());
            }
        }

        if self.plan {
            print_plan(&plan, &self.skip);
            return Ok(());
        }

        let skip = self.skip.clone();
        let script = BuildScript::new(self.into_parameters()?);
        let outputs = BuildOutputs::default();
        let report = target::execute(&plan, &skip, |t| {
            script.run_target(t.action, &outputs)
        });

        report.print_summary();
        report.into_result()
    }

    /// Merge CLI / environment values over build.toml and defaults
    fn into_parameters(self) -> Result<BuildParameters> {
        let root = match self.root {
            Some(root) => root,
            None => find_build_root()?,
        };
        let settings = BuildToml::load(&root)?.build;
        tracing::debug!(root = %root.display(), ?settings, "build settings");

        let configuration = self
            .configuration
            .unwrap_or_else(Configuration::default_for_environment);
        let nuget_server = self
            .nuget_server
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| settings.nuget_server.clone());
        let nuget_symbol_server = self
            .nuget_symbol_server
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| settings.nuget_symbol_server.clone());

        Ok(BuildParameters {
            root,
            settings,
            configuration,
            version_override: self.version_override,
            nuget_server,
            nuget_symbol_server,
            nuget_api_key: self.nuget_api_key,
            push_symbols: self.push_symbols,
        })
    }
}

fn print_targets(graph: &TargetGraph<BuildTarget>) {
    println!("{}", style("Targets:").bold());
    let width = graph.names().iter().map(String::len).max().unwrap_or(0);

    for target in graph.targets() {
        let marker = if target.name.eq_ignore_ascii_case(DEFAULT_TARGET) {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {}  {}{}",
            style(format!("{:width$}", target.name, width = width)).cyan(),
            target.description.as_deref().unwrap_or(""),
            style(marker).dim()
        );

        for (label, names) in [
            ("depends on", &target.depends_on),
            ("before", &target.before),
            ("after", &target.after),
        ] {
            if !names.is_empty() {
                println!(
                    "  {:width$}    {} {}",
                    "",
                    style(label).dim(),
                    names.join(", "),
                    width = width
                );
            }
        }
    }
}

fn print_plan(plan: &[&Target<BuildTarget>], skip: &[String]) {
    println!("{}", style("Execution plan:").bold());
    for (i, target) in plan.iter().enumerate() {
        let skipped = skip.iter().any(|s| s.eq_ignore_ascii_case(&target.name));
        if skipped {
            println!("  {}. {} {}", i + 1, target.name, style("(skipped)").dim());
        } else {
            println!("  {}. {}", i + 1, target.name);
        }
    }
}
