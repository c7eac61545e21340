//! Per-task event reporting
//!
//! The executor never logs through global state directly; it calls a
//! [`DispatchReporter`] handed to it at construction time.

use dispatch_core::{RunReport, RunStatus, TaskResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Receives dispatch lifecycle events. Called concurrently from workers.
pub trait DispatchReporter: Send + Sync {
    fn run_started(&self, _total: usize, _workers: usize) {}

    fn task_started(&self, _input: &Path) {}

    fn task_finished(&self, result: &TaskResult);

    fn run_finished(&self, _report: &RunReport) {}
}

/// Emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl DispatchReporter for TracingReporter {
    fn run_started(&self, total: usize, workers: usize) {
        tracing::info!(total_tasks = total, workers = workers, "Starting dispatch");
    }

    fn task_started(&self, input: &Path) {
        tracing::debug!(input = %input.display(), "task_started");
    }

    fn task_finished(&self, result: &TaskResult) {
        let duration_ms = result.duration.as_millis() as u64;
        match result.failure() {
            None => {
                dispatch_utils::task_completed(&result.input_path, &result.output_path, duration_ms)
            }
            Some(failure) => dispatch_utils::task_failed(
                &result.input_path,
                &failure.kind.to_string(),
                &failure.detail,
                duration_ms,
            ),
        }
    }

    fn run_finished(&self, report: &RunReport) {
        let elapsed_ms = report.elapsed.as_millis() as u64;
        match report.status() {
            RunStatus::Clean => tracing::info!(
                total = report.total(),
                elapsed_ms = elapsed_ms,
                "All tasks succeeded"
            ),
            RunStatus::Failed { failed, total } => tracing::warn!(
                failed = failed,
                succeeded = report.succeeded(),
                total = total,
                elapsed_ms = elapsed_ms,
                "Dispatch finished with failures"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DispatchEvent {
    RunStarted { total: usize, workers: usize },
    TaskStarted(PathBuf),
    TaskFinished(TaskResult),
    RunFinished { succeeded: usize, failed: usize },
}

/// Keeps every event in memory, in the order reporters were called
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<DispatchEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().clone()
    }

    /// Finished task results in completion order
    pub fn finished(&self) -> Vec<TaskResult> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                DispatchEvent::TaskFinished(result) => Some(result.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: DispatchEvent) {
        self.events.lock().push(event);
    }
}

impl DispatchReporter for CollectingReporter {
    fn run_started(&self, total: usize, workers: usize) {
        self.push(DispatchEvent::RunStarted { total, workers });
    }

    fn task_started(&self, input: &Path) {
        self.push(DispatchEvent::TaskStarted(input.to_path_buf()));
    }

    fn task_finished(&self, result: &TaskResult) {
        self.push(DispatchEvent::TaskFinished(result.clone()));
    }

    fn run_finished(&self, report: &RunReport) {
        self.push(DispatchEvent::RunFinished {
            succeeded: report.succeeded(),
            failed: report.failed(),
        });
    }
}
