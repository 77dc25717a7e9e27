//! Input discovery when no files are named on the command line

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name pattern of publication exports
pub const INPUT_PATTERN: &str = "*Publication-export.json";

/// Regular files in `dir` matching [`INPUT_PATTERN`], sorted by path.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join(INPUT_PATTERN);
    let pattern_str = pattern.to_string_lossy();

    let mut entries: Vec<_> = glob::glob(&pattern_str)
        .context("invalid glob pattern")?
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    log::debug!("Found {} input files in {}", entries.len(), dir.display());
    Ok(entries)
}
