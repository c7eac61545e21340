//! Task type

use std::path::{Path, PathBuf};

/// One dispatch unit: the prompt for a single input file and where the
/// external process must write its final message.
///
/// A task has no identity beyond its input path. Output paths never collide
/// within one run because basenames in a flat directory are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    input_path: PathBuf,
    prompt: String,
    output_path: PathBuf,
}

impl Task {
    pub fn new(
        input_path: impl Into<PathBuf>,
        prompt: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            prompt: prompt.into(),
            output_path: output_path.into(),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}
