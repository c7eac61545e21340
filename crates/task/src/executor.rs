//! Bounded-concurrency dispatch of pending tasks
//!
//! Every task runs on its own tokio task, gated by a semaphore with one permit
//! per worker slot. A slot is held across read, spawn, stdin write and process
//! wait, so at most `worker_count` children are alive at any instant.
//! Failures are converted to [`TaskResult`]s inside the slot and never reach
//! sibling tasks.

use crate::builder::PendingTask;
use crate::report::{DispatchReporter, TracingReporter};
use crate::runner::{CodexRunner, TaskRunner};
use chrono::Utc;
use dispatch_core::{DispatchConfig, Error, OutputCheck, Result, RunReport, Task, TaskResult};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

pub struct DispatchExecutor {
    config: Arc<DispatchConfig>,
    runner: Arc<dyn TaskRunner>,
    reporter: Arc<dyn DispatchReporter>,
}

impl DispatchExecutor {
    /// Executor that runs codex and reports through `tracing`
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(CodexRunner),
            reporter: Arc::new(TracingReporter),
        }
    }

    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn TaskRunner>) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn DispatchReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run every task and wait for all of them.
    ///
    /// Never returns early: the report holds one result per submitted task.
    pub async fn execute(&self, tasks: Vec<PendingTask>) -> RunReport {
        let workers = self.config.worker_count();
        let span = dispatch_utils::dispatch_span(tasks.len(), workers);

        async move {
            let started_at = Utc::now();
            let clock = Instant::now();
            self.reporter.run_started(tasks.len(), workers);

            let semaphore = Arc::new(Semaphore::new(workers));
            let mut join_set = JoinSet::new();
            let mut unfinished: HashMap<PathBuf, PathBuf> = tasks
                .iter()
                .map(|p| (p.input_path().to_path_buf(), p.output_path().to_path_buf()))
                .collect();

            for pending in tasks {
                let semaphore = Arc::clone(&semaphore);
                let config = Arc::clone(&self.config);
                let runner = Arc::clone(&self.runner);
                let reporter = Arc::clone(&self.reporter);
                let task_span = dispatch_utils::task_span(pending.input_path());

                join_set.spawn(
                    async move {
                        // Held until the child exits; the semaphore is never closed.
                        let _permit = semaphore.acquire_owned().await;
                        let input = pending.input_path().to_path_buf();
                        let output = pending.output_path().to_path_buf();
                        let started = Instant::now();
                        let slot = run_slot(pending, &config, runner.as_ref(), reporter.as_ref());
                        AssertUnwindSafe(slot)
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|panic| {
                                let error = slot_panicked(&config, panic.as_ref());
                                TaskResult::failed(input, output, &error, started.elapsed())
                            })
                    }
                    .instrument(task_span),
                );
            }

            let mut results = Vec::with_capacity(join_set.len());
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => {
                        unfinished.remove(&result.input_path);
                        results.push(result);
                    }
                    Err(e) => tracing::error!(error = %e, "Worker slot terminated abnormally"),
                }
            }

            // A slot that died without a result still counts as a failed task.
            for (input, output) in unfinished {
                let error = Error::process_execution(
                    self.config.executable_path().display().to_string(),
                    None,
                    "worker slot terminated before producing a result",
                );
                results.push(TaskResult::failed(input, output, &error, Duration::ZERO));
            }

            let report = RunReport::new(started_at, clock.elapsed(), results);
            self.reporter.run_finished(&report);
            report
        }
        .instrument(span)
        .await
    }
}

/// Run `tasks` with codex under `config`, logging through `tracing`
pub async fn execute(tasks: Vec<PendingTask>, config: DispatchConfig) -> RunReport {
    DispatchExecutor::new(config).execute(tasks).await
}

async fn run_slot(
    pending: PendingTask,
    config: &DispatchConfig,
    runner: &dyn TaskRunner,
    reporter: &dyn DispatchReporter,
) -> TaskResult {
    let started = Instant::now();
    reporter.task_started(pending.input_path());

    let outcome = AssertUnwindSafe(dispatch_one(&pending, config, runner))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(slot_panicked(config, panic.as_ref())));

    let result = match outcome {
        Ok(()) => TaskResult::succeeded(
            pending.input_path(),
            pending.output_path(),
            started.elapsed(),
        ),
        Err(e) => TaskResult::failed(
            pending.input_path(),
            pending.output_path(),
            &e,
            started.elapsed(),
        ),
    };

    reporter.task_finished(&result);
    result
}

/// read -> spawn -> write stdin -> wait, strictly in that order
async fn dispatch_one(
    pending: &PendingTask,
    config: &DispatchConfig,
    runner: &dyn TaskRunner,
) -> Result<()> {
    let task = pending.load(config.template_text()).await?;
    runner.run(&task, config).await?;
    verify_output(&task, config.output_check()).await
}

async fn verify_output(task: &Task, check: OutputCheck) -> Result<()> {
    let exists = tokio::fs::try_exists(task.output_path())
        .await
        .unwrap_or(false);
    if exists {
        return Ok(());
    }

    match check {
        OutputCheck::Trust => {
            tracing::warn!(
                output = %task.output_path().display(),
                "codex exited successfully without writing its output file"
            );
            Ok(())
        }
        OutputCheck::RequireFile => Err(Error::missing_output(task.output_path())),
    }
}

fn slot_panicked(config: &DispatchConfig, panic: &(dyn Any + Send)) -> Error {
    Error::process_execution(
        config.executable_path().display().to_string(),
        None,
        format!("worker panicked: {}", panic_message(panic)),
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, DispatchEvent};
    use async_trait::async_trait;
    use dispatch_core::{RunStatus, TaskFailureKind};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes the prompt to the output path and tracks how many runs overlap
    #[derive(Default)]
    struct RecordingRunner {
        active: AtomicUsize,
        high_water: AtomicUsize,
        fail_when_prompt_contains: Option<&'static str>,
        panic_when_prompt_contains: Option<&'static str>,
    }

    #[async_trait]
    impl TaskRunner for RecordingRunner {
        async fn run(&self, task: &Task, config: &DispatchConfig) -> Result<()> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if let Some(marker) = self.panic_when_prompt_contains {
                if task.prompt().contains(marker) {
                    panic!("runner exploded");
                }
            }
            if let Some(marker) = self.fail_when_prompt_contains {
                if task.prompt().contains(marker) {
                    return Err(Error::process_execution(
                        config.executable_path().display().to_string(),
                        Some(1),
                        "",
                    ));
                }
            }
            fs::write(task.output_path(), task.prompt())
                .map_err(|e| Error::file_system(task.output_path(), "write output", e))
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        data: std::path::PathBuf,
        out: std::path::PathBuf,
    }

    fn fixture(files: &[(&str, &[u8])]) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let data = temp_dir.path().join("data");
        let out = temp_dir.path().join("out");
        fs::create_dir(&data).unwrap();
        fs::create_dir(&out).unwrap();
        for (name, content) in files {
            fs::write(data.join(name), content).unwrap();
        }
        Fixture {
            _temp_dir: temp_dir,
            data,
            out,
        }
    }

    fn config(workers: usize) -> DispatchConfig {
        DispatchConfig::new("Summarize:", "/usr/bin/codex", "/", workers).unwrap()
    }

    fn plan(fx: &Fixture) -> Vec<PendingTask> {
        crate::builder::plan_tasks(&fx.data, &fx.out).unwrap()
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_worker_count() {
        let names: Vec<String> = (0..12).map(|i| format!("f{i:02}.txt")).collect();
        let files: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), &b"x"[..])).collect();
        let fx = fixture(&files);
        let runner = Arc::new(RecordingRunner::default());

        let report = DispatchExecutor::new(config(3))
            .with_runner(runner.clone())
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(plan(&fx))
            .await;

        assert_eq!(report.status(), RunStatus::Clean);
        assert_eq!(report.total(), 12);
        let high_water = runner.high_water.load(Ordering::SeqCst);
        assert_eq!(high_water, 3, "high water mark was {high_water}");
    }

    #[tokio::test]
    async fn test_single_worker_still_completes_everything() {
        let fx = fixture(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")]);
        let runner = Arc::new(RecordingRunner::default());

        let report = DispatchExecutor::new(config(1))
            .with_runner(runner.clone())
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(plan(&fx))
            .await;

        assert_eq!(report.succeeded(), 3);
        assert_eq!(runner.high_water.load(Ordering::SeqCst), 1);
        for name in ["a.txt", "b.txt", "c.txt"] {
            assert!(fx.out.join(format!("{name}-codex")).exists());
        }
    }

    #[tokio::test]
    async fn test_more_workers_than_tasks() {
        let fx = fixture(&[("only.txt", b"hello")]);

        let report = DispatchExecutor::new(config(16))
            .with_runner(Arc::new(RecordingRunner::default()))
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(plan(&fx))
            .await;

        assert!(report.status().is_clean());
        let written = fs::read_to_string(fx.out.join("only.txt-codex")).unwrap();
        assert_eq!(written, "Summarize:\nhello");
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_reported() {
        let fx = fixture(&[
            ("bad.txt", b"FAIL me"),
            ("good1.txt", b"fine"),
            ("good2.txt", b"also fine"),
            ("binary.dat", &[0xc3, 0x28]),
        ]);
        let runner = Arc::new(RecordingRunner {
            fail_when_prompt_contains: Some("FAIL"),
            ..Default::default()
        });
        let reporter = Arc::new(CollectingReporter::new());

        let report = DispatchExecutor::new(config(2))
            .with_runner(runner)
            .with_reporter(reporter.clone())
            .execute(plan(&fx))
            .await;

        assert_eq!(report.status(), RunStatus::Failed { failed: 2, total: 4 });
        assert!(!fx.out.join("bad.txt-codex").exists());
        assert!(!fx.out.join("binary.dat-codex").exists());
        assert!(fx.out.join("good1.txt-codex").exists());
        assert!(fx.out.join("good2.txt-codex").exists());

        let kinds: Vec<(String, TaskFailureKind)> = report
            .failures()
            .map(|r| {
                let name = r.input_path().file_name().unwrap().to_string_lossy();
                (name.into_owned(), r.failure().unwrap().kind)
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("bad.txt".to_string(), TaskFailureKind::Execution),
                ("binary.dat".to_string(), TaskFailureKind::Read),
            ]
        );

        // one started and one finished event per task, bracketed by run events
        let events = reporter.events();
        assert!(matches!(events.first(), Some(DispatchEvent::RunStarted { total: 4, workers: 2 })));
        assert!(matches!(
            events.last(),
            Some(DispatchEvent::RunFinished { succeeded: 2, failed: 2 })
        ));
        assert_eq!(reporter.finished().len(), 4);
        let started = events
            .iter()
            .filter(|e| matches!(e, DispatchEvent::TaskStarted(_)))
            .count();
        assert_eq!(started, 4);
    }

    #[tokio::test]
    async fn test_panicking_runner_fails_only_its_task() {
        let fx = fixture(&[("boom.txt", b"PANIC"), ("calm.txt", b"ok")]);
        let runner = Arc::new(RecordingRunner {
            panic_when_prompt_contains: Some("PANIC"),
            ..Default::default()
        });

        let report = DispatchExecutor::new(config(2))
            .with_runner(runner)
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(plan(&fx))
            .await;

        assert_eq!(report.total(), 2);
        let failure = report.results[0].failure().unwrap();
        assert_eq!(failure.kind, TaskFailureKind::Execution);
        assert!(failure.detail.contains("runner exploded"));
        assert!(report.results[1].is_success());
    }

    #[tokio::test]
    async fn test_panicking_reporter_still_yields_a_result_per_task() {
        struct FlakyReporter;

        impl DispatchReporter for FlakyReporter {
            fn task_started(&self, input: &std::path::Path) {
                if input.ends_with("b.txt") {
                    panic!("reporter exploded");
                }
            }

            fn task_finished(&self, _result: &TaskResult) {}
        }

        let fx = fixture(&[("a.txt", b"a"), ("b.txt", b"b")]);
        let tasks = plan(&fx);
        let submitted = tasks.len();

        let report = DispatchExecutor::new(config(2))
            .with_runner(Arc::new(RecordingRunner::default()))
            .with_reporter(Arc::new(FlakyReporter))
            .execute(tasks)
            .await;

        assert_eq!(report.total(), submitted);
        assert_eq!(report.status(), RunStatus::Failed { failed: 1, total: 2 });
        assert!(report.results[0].is_success());
        let failure = report.results[1].failure().unwrap();
        assert_eq!(failure.kind, TaskFailureKind::Execution);
        assert!(failure.detail.contains("reporter exploded"), "{}", failure.detail);
    }

    #[tokio::test]
    async fn test_empty_plan_is_clean() {
        let report = DispatchExecutor::new(config(4))
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(Vec::new())
            .await;
        assert_eq!(report.total(), 0);
        assert!(report.status().is_clean());
    }

    #[tokio::test]
    async fn test_required_output_missing_is_failure() {
        struct SilentRunner;

        #[async_trait]
        impl TaskRunner for SilentRunner {
            async fn run(&self, _task: &Task, _config: &DispatchConfig) -> Result<()> {
                Ok(())
            }
        }

        let fx = fixture(&[("a.txt", b"a")]);

        let trusting = DispatchExecutor::new(config(1))
            .with_runner(Arc::new(SilentRunner))
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(plan(&fx))
            .await;
        assert!(trusting.status().is_clean());

        let strict = DispatchExecutor::new(config(1).with_output_check(OutputCheck::RequireFile))
            .with_runner(Arc::new(SilentRunner))
            .with_reporter(Arc::new(CollectingReporter::new()))
            .execute(plan(&fx))
            .await;
        let failure = strict.results[0].failure().unwrap();
        assert_eq!(failure.kind, TaskFailureKind::MissingOutput);
        assert!(!fx.out.join("a.txt-codex").exists());
    }
}
