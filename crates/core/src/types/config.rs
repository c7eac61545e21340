//! Run-wide dispatch configuration

use crate::errors::{Error, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// How a zero exit status is interpreted with respect to the output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputCheck {
    /// Exit status 0 is success; the output file is not inspected
    #[default]
    Trust,
    /// Exit status 0 without an output file is a task failure
    RequireFile,
}

/// What happens to the child's stdout and stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildOutput {
    /// Child output goes straight to the dispatcher's own stdout/stderr
    #[default]
    Inherit,
    /// Child output is captured; stderr is attached to failure details
    Capture,
}

/// Settings shared by every worker for the lifetime of one run.
///
/// Built once at startup and never mutated afterwards, so workers share it
/// behind an `Arc` without any locking.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    template_text: String,
    executable_path: PathBuf,
    working_directory: PathBuf,
    worker_count: NonZeroUsize,
    output_check: OutputCheck,
    child_output: ChildOutput,
}

impl DispatchConfig {
    /// Create a config with default output handling.
    ///
    /// Fails when `worker_count` is zero.
    pub fn new(
        template_text: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        working_directory: impl Into<PathBuf>,
        worker_count: usize,
    ) -> Result<Self> {
        let worker_count = NonZeroUsize::new(worker_count)
            .ok_or_else(|| Error::configuration("worker count must be at least 1"))?;

        Ok(Self {
            template_text: template_text.into(),
            executable_path: executable_path.into(),
            working_directory: working_directory.into(),
            worker_count,
            output_check: OutputCheck::default(),
            child_output: ChildOutput::default(),
        })
    }

    #[must_use]
    pub fn with_output_check(mut self, output_check: OutputCheck) -> Self {
        self.output_check = output_check;
        self
    }

    #[must_use]
    pub fn with_child_output(mut self, child_output: ChildOutput) -> Self {
        self.child_output = child_output;
        self
    }

    pub fn template_text(&self) -> &str {
        &self.template_text
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count.get()
    }

    pub fn output_check(&self) -> OutputCheck {
        self.output_check
    }

    pub fn child_output(&self) -> ChildOutput {
        self.child_output
    }
}
