//! Startup resolution and the top-level dispatch entry point

use crate::cli::Cli;
use crate::resolve::resolve_executable;
use dispatch_core::{DispatchConfig, Error, Result, RunReport, RunStatus};
use dispatch_task::{plan_tasks, DispatchExecutor, PendingTask};
use std::fs;
use std::path::Path;

/// Everything resolved before the first task runs
#[derive(Debug)]
pub struct Prepared {
    pub config: DispatchConfig,
    pub tasks: Vec<PendingTask>,
}

/// Resolve configuration and plan tasks.
///
/// Any error here is fatal and happens before a single codex process starts.
/// Paths are made absolute against `cwd` because codex runs in its own
/// working directory.
pub fn prepare(cli: &Cli, cwd: &Path) -> Result<Prepared> {
    let template_path = cwd.join(&cli.template);
    let template_text = fs::read_to_string(&template_path)
        .map_err(|e| Error::file_system(&template_path, "read template", e))?;

    let executable = resolve_executable(cli.codex.as_deref(), cwd)?;

    let working_directory = match &cli.working_dir {
        Some(dir) => cwd.join(dir),
        None => cwd.to_path_buf(),
    };
    if !working_directory.is_dir() {
        return Err(Error::configuration(format!(
            "working directory '{}' is not a directory",
            working_directory.display()
        )));
    }

    let output_dir = cwd.join(&cli.output_dir);
    let tasks = plan_tasks(&cwd.join(&cli.data_dir), &output_dir)?;
    fs::create_dir_all(&output_dir)
        .map_err(|e| Error::file_system(&output_dir, "create output directory", e))?;

    let config = DispatchConfig::new(
        template_text,
        executable,
        working_directory,
        cli.workers.get(),
    )?
    .with_output_check(cli.output_check())
    .with_child_output(cli.child_output());

    Ok(Prepared { config, tasks })
}

/// Resolve, dispatch every task and report the overall status.
///
/// Returns `Err` only for startup failures; task failures are reflected in
/// the returned status.
pub async fn run(cli: Cli) -> Result<RunStatus> {
    let cwd = std::env::current_dir()
        .map_err(|e| Error::file_system(".", "get current directory", e))?;
    let Prepared { config, tasks } = prepare(&cli, &cwd)?;

    tracing::info!(
        codex = %config.executable_path().display(),
        working_directory = %config.working_directory().display(),
        tasks = tasks.len(),
        workers = config.worker_count(),
        "Resolved dispatch configuration"
    );

    let report = DispatchExecutor::new(config).execute(tasks).await;

    if let Some(path) = &cli.summary {
        let path = cwd.join(path);
        // The run already happened; a lost summary must not hide its status.
        if let Err(e) = write_summary(&path, &report) {
            tracing::error!(error = %e, "Failed to write run summary");
        }
    }

    Ok(report.status())
}

/// Write the JSON summary for `report` to `path`
pub fn write_summary(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.summary())
        .map_err(|e| Error::configuration(format!("failed to serialize summary: {e}")))?;
    fs::write(path, json).map_err(|e| Error::file_system(path, "write summary", e))
}
