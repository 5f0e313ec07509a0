//! Path utilities for slnbuild

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Settings file marking the build root
pub const SETTINGS_FILE: &str = "build.toml";

/// Legacy marker file that also identifies a build root
pub const ROOT_MARKER: &str = ".nuke";

/// Find the build root by walking up from `start`
///
/// The first directory containing `build.toml` or `.nuke` wins. When neither
/// exists anywhere above, `start` itself is the root.
pub fn find_build_root_from(start: &Path) -> PathBuf {
    let mut dir = start;
    loop {
        if dir.join(SETTINGS_FILE).is_file() || dir.join(ROOT_MARKER).exists() {
            return dir.to_path_buf();
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return start.to_path_buf(),
        }
    }
}

/// Find the build root starting from the current directory
pub fn find_build_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    Ok(find_build_root_from(&current_dir))
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Make `path` an existing, empty directory
pub fn ensure_clean_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return ensure_dir(path);
    }

    for entry in fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", path.display()))?;
        let entry_path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", entry_path.display()))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&entry_path)
                .with_context(|| format!("Failed to remove directory: {}", entry_path.display()))?;
        } else {
            fs::remove_file(&entry_path)
                .with_context(|| format!("Failed to remove file: {}", entry_path.display()))?;
        }
    }
    Ok(())
}

/// Convert a Windows-style relative path from a solution file to a native path
pub fn normalize_separators(path: &str) -> PathBuf {
    path.split(['\\', '/']).filter(|s| !s.is_empty()).collect()
}
