//! Publish target: package discovery, partitioning and sequential push

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Configuration;

/// File name marker of symbol packages
pub const SYMBOL_MARKER: &str = ".symbols.";

/// Packages found in the build output, split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    /// Ordinary packages, pushed to the package feed
    pub packages: Vec<PathBuf>,

    /// Debug symbol packages
    pub symbol_packages: Vec<PathBuf>,
}

/// Glob pattern of the packages produced under `source_dir` for `configuration`
pub fn package_pattern(source_dir: &Path, configuration: Configuration) -> String {
    let base = glob::Pattern::escape(&source_dir.to_string_lossy());
    format!("{}/**/bin/{}/*.nupkg", base, configuration)
}

/// Enumerate built packages in sorted path order
pub fn find_packages(source_dir: &Path, configuration: Configuration) -> Result<Vec<PathBuf>> {
    let pattern = package_pattern(source_dir, configuration);
    let mut found = Vec::new();
    let entries =
        glob::glob(&pattern).with_context(|| format!("Invalid package pattern {}", pattern))?;
    for entry in entries {
        let path = entry.context("Failed to read package path")?;
        if path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    tracing::debug!(%pattern, count = found.len(), "found packages");
    Ok(found)
}

/// Split packages into ordinary and symbol packages, keeping their order
pub fn partition_packages<I>(files: I) -> PackageSet
where
    I: IntoIterator<Item = PathBuf>,
{
    let (symbol_packages, packages): (Vec<PathBuf>, Vec<PathBuf>) =
        files.into_iter().partition(|p| is_symbol_package(p));
    PackageSet {
        packages,
        symbol_packages,
    }
}

fn is_symbol_package(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(SYMBOL_MARKER))
        .unwrap_or(false)
}

/// Push `packages` one at a time in order, stopping at the first failure
///
/// Returns the number of packages pushed.
pub fn push_packages<F>(packages: &[PathBuf], mut push: F) -> Result<usize>
where
    F: FnMut(&Path) -> Result<()>,
{
    for (i, package) in packages.iter().enumerate() {
        tracing::debug!(package = %package.display(), "pushing {}/{}", i + 1, packages.len());
        push(package)?;
    }
    Ok(packages.len())
}
