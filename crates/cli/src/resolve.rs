//! Locating the codex executable
//!
//! Order: explicit `--codex` path, then `codex` on `PATH`, then exactly one
//! executable file in the current directory whose name contains `codex`
//! (release archives ship binaries such as `codex-x86_64-unknown-linux-musl`).
//! Anything else is a startup error.

use dispatch_core::{Error, Result, CODEX_BINARY_NAME, CODEX_BINARY_PATTERN};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve codex using the process `PATH`
pub fn resolve_executable(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    resolve_executable_in(explicit, std::env::var_os("PATH"), cwd)
}

/// Resolve codex against an explicit search path
pub fn resolve_executable_in(
    explicit: Option<&Path>,
    search_path: Option<OsString>,
    cwd: &Path,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = cwd.join(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(Error::configuration(format!(
            "codex executable '{}' does not exist or is not a file",
            path.display()
        )));
    }

    if let Some(paths) = search_path {
        if let Ok(found) = which::which_in(CODEX_BINARY_NAME, Some(paths), cwd) {
            tracing::debug!(path = %found.display(), "Found codex on PATH");
            return Ok(found);
        }
    }

    let mut candidates = local_candidates(cwd)?;
    match candidates.len() {
        1 => {
            let found = candidates.remove(0);
            tracing::debug!(path = %found.display(), "Found codex in current directory");
            Ok(found)
        }
        0 => Err(Error::configuration(format!(
            "could not find '{CODEX_BINARY_NAME}' on PATH or an executable containing \
             '{CODEX_BINARY_PATTERN}' in '{}'; pass --codex",
            cwd.display()
        ))),
        _ => {
            let names: Vec<String> = candidates
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            Err(Error::configuration(format!(
                "found {} codex candidates in '{}' ({}); pass --codex to choose one",
                candidates.len(),
                cwd.display(),
                names.join(", ")
            )))
        }
    }
}

/// Executable regular files in `dir` whose name contains the codex pattern
fn local_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).map_err(|e| Error::file_system(dir, "read directory", e))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .contains(CODEX_BINARY_PATTERN)
        })
        .map(|entry| entry.path())
        .filter(|path| is_executable_file(path))
        .collect();
    candidates.sort();
    Ok(candidates)
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}
