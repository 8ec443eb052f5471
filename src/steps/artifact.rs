//! Glob-based file resolution used by the build, profile and move steps

use crate::core::step::StepError;
use std::path::{Path, PathBuf};

/// Expand `pattern` relative to `base` into the matching regular files.
///
/// Absolute patterns are used as-is.
pub fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, StepError> {
    let full = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        base.join(pattern)
    };
    let full = full.to_string_lossy().into_owned();

    let entries = glob::glob(&full)
        .map_err(|e| StepError::Invalid(format!("Invalid glob pattern '{}': {}", pattern, e)))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    Ok(entries)
}

/// Most recently modified executable matching `pattern`
pub fn newest_executable(base: &Path, pattern: &str) -> Result<Option<PathBuf>, StepError> {
    let newest = expand(base, pattern)?
        .into_iter()
        .filter(|p| is_executable(p))
        .max_by_key(|p| p.metadata().and_then(|m| m.modified()).ok());
    Ok(newest)
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("exe"))
            .unwrap_or(false)
}

/// All files below `dir`, skipping any directory named in `skip_dirs`
pub fn walk_files(dir: &Path, skip_dirs: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| skip_dirs.contains(&n))
                    .unwrap_or(false);
                if !skipped {
                    pending.push(path);
                }
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
