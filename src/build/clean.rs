//! Clean target: removes build intermediates and resets the output directory

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::utils::paths::ensure_clean_dir;

/// Directory names produced by MSBuild under each project
const INTERMEDIATE_DIRS: [&str; 2] = ["bin", "obj"];

/// Find every `bin` / `obj` directory below `base`, without descending into them
pub fn find_intermediate_dirs(base: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !base.is_dir() {
        return Ok(found);
    }

    let mut entries = WalkDir::new(base).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = entries.next() {
        let entry = entry.with_context(|| format!("Failed to walk {}", base.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_intermediate = entry
            .file_name()
            .to_str()
            .is_some_and(|name| INTERMEDIATE_DIRS.contains(&name));
        if is_intermediate {
            found.push(entry.into_path());
            entries.skip_current_dir();
        }
    }
    Ok(found)
}

/// Delete intermediates under each of `dirs`, then empty `output_dir`
///
/// Returns the removed directories. Nothing is restored if a removal fails
/// part way.
pub fn clean(dirs: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for base in dirs {
        for dir in find_intermediate_dirs(base)? {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
            tracing::debug!(dir = %dir.display(), "removed");
            removed.push(dir);
        }
    }

    ensure_clean_dir(output_dir)?;
    Ok(removed)
}
