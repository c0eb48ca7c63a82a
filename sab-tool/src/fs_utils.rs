use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::Pattern;

use crate::naming::ARCHIVE_SUFFIX;

/// Compile skip patterns with proper error handling.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid skip pattern: {p}")))
        .collect()
}

/// Recursively lists every regular file under `folder` that is eligible for
/// archiving: archives themselves (`*.a`) are never collected, nor is
/// anything matching a skip pattern.
pub fn collect_files(folder: &Path, skip_patterns: &[Pattern]) -> Result<Vec<PathBuf>> {
    fn is_skipped(path: &Path, patterns: &[Pattern]) -> bool {
        let path_str = path.to_string_lossy();
        patterns.iter().any(|p| p.matches(&path_str))
    }

    fn is_archive(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == ARCHIVE_SUFFIX)
    }

    fn walk_dir(dir: &Path, patterns: &[Pattern], result: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir).with_context(|| format!("reading directory {dir:?}"))? {
            let entry = entry?;
            let path = entry.path();

            if is_skipped(&path, patterns) {
                continue;
            }

            if path.is_dir() {
                walk_dir(&path, patterns, result)?;
            } else if path.is_file() && !is_archive(&path) {
                result.push(path);
            }
        }
        Ok(())
    }

    let mut result = Vec::new();
    walk_dir(folder, skip_patterns, &mut result)?;
    Ok(result)
}
