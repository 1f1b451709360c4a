//! Shared helpers for commands.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Collects files with `extension` under `dir`, sorted for deterministic
/// processing order. Descends into sub-directories only when `recursive`.
pub fn collect_files(dir: &Path, recursive: bool, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }
    let mut files = Vec::new();
    collect_into(dir, recursive, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_into(
    dir: &Path,
    recursive: bool,
    extension: &str,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_into(&path, recursive, extension, files)?;
            }
        } else if path.extension().is_some_and(|e| e == extension) {
            files.push(path);
        }
    }
    Ok(())
}
