//! Input file and capture directory resolution.
//!
//! Everything the run touches is resolved to an absolute path up front:
//! workers must not depend on the working directory, and error messages
//! should name the path that was actually checked. Absolutization is
//! lexical, so a symlinked input keeps its own name in everything derived
//! from it (`{{OUTPUT}}` values, capture file names). Input files are
//! mandatory (a missing one is a configuration error); capture directories
//! degrade to "discard the stream" with a warning, because losing
//! diagnostics should not kill a long batch.

use crate::error::{MprunError, Result};
use std::env;
use std::path::{self, Path, PathBuf};

/// Expand a leading `~` against the user's home directory.
///
/// Only the bare `~` and `~/...` forms are handled; `~user` is passed
/// through untouched. Paths without a tilde come back unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };
    let Some(rest) = raw.strip_prefix('~') else {
        return path.to_path_buf();
    };
    let Some(home) = home_dir() else {
        return path.to_path_buf();
    };

    if rest.is_empty() {
        home
    } else if let Some(tail) = rest.strip_prefix('/') {
        home.join(tail)
    } else if let Some(tail) = rest.strip_prefix('\\') {
        home.join(tail)
    } else {
        // ~user form
        path.to_path_buf()
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Resolve the input file list to absolute paths, in order.
///
/// Each entry is tilde-expanded and must name an existing regular file
/// (symlinks to one count). Absolutization does not resolve symlinks: a
/// link keeps its own file name, so names derived from it stay the ones
/// the user passed in.
///
/// # Errors
///
/// Returns `MprunError::Config` naming the first entry that does not
/// resolve to a regular file.
pub fn resolve_input_files(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::with_capacity(files.len());
    for file in files {
        let expanded = expand_tilde(file);
        if !expanded.is_file() {
            return Err(MprunError::Config(format!(
                "input file '{}' does not exist or is not a regular file",
                expanded.display()
            )));
        }
        let absolute = path::absolute(&expanded).map_err(|e| {
            MprunError::Config(format!(
                "failed to resolve input file '{}': {}",
                expanded.display(),
                e
            ))
        })?;
        resolved.push(absolute);
    }
    Ok(resolved)
}

/// Resolve a capture directory, degrading to `None` when it is missing.
///
/// A missing directory is a warning, not an error: the run proceeds and the
/// corresponding stream is discarded for every job. `stream` names the
/// stream ("stdout" or "stderr") in the warning line.
pub fn resolve_capture_dir(dir: &Path, stream: &str) -> Option<PathBuf> {
    let expanded = expand_tilde(dir);
    match path::absolute(&expanded) {
        Ok(absolute) if absolute.is_dir() => Some(absolute),
        _ => {
            eprintln!(
                "Warning: {} capture directory '{}' does not exist; per-job {} will be discarded",
                stream,
                expanded.display(),
                stream
            );
            None
        }
    }
}
