//! Per-task results and the aggregated run report

use crate::errors::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Category of a per-task failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFailureKind {
    /// The input file could not be read as text
    Read,
    /// The external executable could not be launched
    Spawn,
    /// The external executable exited non-zero or was killed
    Execution,
    /// Exit 0 without an output file, when the output is required
    MissingOutput,
}

impl fmt::Display for TaskFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskFailureKind::Read => "read",
            TaskFailureKind::Spawn => "spawn",
            TaskFailureKind::Execution => "execution",
            TaskFailureKind::MissingOutput => "missing_output",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: TaskFailureKind,
    pub detail: String,
}

impl TaskFailure {
    /// Convert a per-task error into a recorded failure.
    ///
    /// Startup errors never reach a task, but if one does it is filed under
    /// `Execution` rather than dropped.
    pub fn from_error(error: &Error) -> Self {
        Self {
            kind: error.failure_kind().unwrap_or(TaskFailureKind::Execution),
            detail: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(TaskFailure),
}

/// The result of dispatching one input file
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub outcome: TaskOutcome,
    pub duration: Duration,
}

impl TaskResult {
    pub fn succeeded(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        duration: Duration,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            outcome: TaskOutcome::Succeeded,
            duration,
        }
    }

    pub fn failed(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        error: &Error,
        duration: Duration,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            outcome: TaskOutcome::Failed(TaskFailure::from_error(error)),
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Succeeded)
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match &self.outcome {
            TaskOutcome::Succeeded => None,
            TaskOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }
}

/// Overall status of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every task succeeded (vacuously true for an empty input directory)
    Clean,
    /// At least one task failed; every task was still attempted
    Failed { failed: usize, total: usize },
}

impl RunStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, RunStatus::Clean)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Clean => crate::constants::EXIT_CLEAN,
            RunStatus::Failed { .. } => crate::constants::EXIT_TASKS_FAILED,
        }
    }
}

/// Everything a dispatch run produced, one entry per attempted task
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub results: Vec<TaskResult>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, elapsed: Duration, mut results: Vec<TaskResult>) -> Self {
        results.sort_by(|a, b| a.input_path.cmp(&b.input_path));
        Self {
            started_at,
            elapsed,
            results,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn status(&self) -> RunStatus {
        match self.failed() {
            0 => RunStatus::Clean,
            failed => RunStatus::Failed {
                failed,
                total: self.total(),
            },
        }
    }

    /// Serializable view of the report
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            elapsed_ms: self.elapsed.as_millis() as u64,
            total: self.total(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            tasks: self.results.iter().map(TaskSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TaskFailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl From<&TaskResult> for TaskSummary {
    fn from(result: &TaskResult) -> Self {
        let failure = result.failure();
        Self {
            input: result.input_path.clone(),
            output: result.output_path.clone(),
            status: if failure.is_some() { "failed" } else { "succeeded" },
            kind: failure.map(|f| f.kind),
            error: failure.map(|f| f.detail.clone()),
            duration_ms: result.duration.as_millis() as u64,
        }
    }
}
