//! Task discovery and prompt construction
//!
//! Inputs are discovered eagerly at startup, but their contents are only read
//! once a worker slot picks them up. A file that cannot be read therefore
//! fails its own task instead of the whole run.

use dispatch_core::{Error, Result, Task, OUTPUT_SUFFIX, PROMPT_SEPARATOR};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// A discovered input whose contents have not been read yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTask {
    input_path: PathBuf,
    output_path: PathBuf,
}

impl PendingTask {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: &Path) -> Self {
        let input_path = input_path.into();
        let output_path = output_path_for(&input_path, output_dir);
        Self {
            input_path,
            output_path,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Read the input file and build the final task.
    ///
    /// Contents must be valid UTF-8; anything else is a `TaskRead` error.
    pub async fn load(&self, template: &str) -> Result<Task> {
        let content = tokio::fs::read_to_string(&self.input_path)
            .await
            .map_err(|e| Error::task_read(&self.input_path, e))?;

        Ok(Task::new(
            self.input_path.clone(),
            compose_prompt(template, &content),
            self.output_path.clone(),
        ))
    }
}

/// Join the template and an input file's contents with the fixed separator
pub fn compose_prompt(template: &str, content: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + PROMPT_SEPARATOR.len() + content.len());
    prompt.push_str(template);
    prompt.push_str(PROMPT_SEPARATOR);
    prompt.push_str(content);
    prompt
}

/// `<output_dir>/<basename(input)>-codex`
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from(input.as_os_str()));
    name.push(OUTPUT_SUFFIX);
    output_dir.join(name)
}

/// List the regular files directly inside `data_dir`.
///
/// The scan is shallow. Subdirectories, special files and dangling symlinks
/// are skipped without logging; symlinks to regular files are kept. Results
/// are sorted so runs dispatch in a stable order.
pub fn discover_inputs(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir)
        .map_err(|e| Error::file_system(data_dir, "read directory", e))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::file_system(data_dir, "read directory entry", e))?;
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => inputs.push(path),
            _ => continue,
        }
    }

    inputs.sort();
    Ok(inputs)
}

/// Discover inputs and pair each with its output path
pub fn plan_tasks(data_dir: &Path, output_dir: &Path) -> Result<Vec<PendingTask>> {
    Ok(discover_inputs(data_dir)?
        .into_iter()
        .map(|input| PendingTask::new(input, output_dir))
        .collect())
}

/// Build every task up front.
///
/// Unreadable inputs appear as `Err` entries; they never prevent the other
/// tasks from being built.
pub async fn build_tasks(
    data_dir: &Path,
    template: &str,
    output_dir: &Path,
) -> Result<Vec<Result<Task>>> {
    let mut tasks = Vec::new();
    for pending in plan_tasks(data_dir, output_dir)? {
        tasks.push(pending.load(template).await);
    }
    Ok(tasks)
}
