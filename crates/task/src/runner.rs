//! External process invocation
//!
//! One call to [`TaskRunner::run`] owns one child process from spawn to exit.
//! The prompt is written on stdin while the child is awaited so a child that
//! fills its stdout pipe before draining stdin cannot deadlock us.

use async_trait::async_trait;
use dispatch_core::{
    ChildOutput, DispatchConfig, Error, Result, Task, CODEX_BYPASS_FLAG, CODEX_CWD_FLAG,
    CODEX_EXEC_SUBCOMMAND, CODEX_OUTPUT_FLAG, CODEX_SKIP_GIT_CHECK_FLAG, STDERR_TAIL_BYTES,
};
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

/// Runs a single task to completion.
///
/// Implementations report success only when the work for the task is done;
/// any error is scoped to that task.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: &Task, config: &DispatchConfig) -> Result<()>;
}

/// Runs `codex exec` for each task
#[derive(Debug, Default, Clone, Copy)]
pub struct CodexRunner;

/// Fixed argument list for one non-interactive codex invocation
pub fn codex_args(output_path: &Path, working_directory: &Path) -> Vec<OsString> {
    vec![
        CODEX_EXEC_SUBCOMMAND.into(),
        CODEX_OUTPUT_FLAG.into(),
        output_path.as_os_str().to_os_string(),
        CODEX_BYPASS_FLAG.into(),
        CODEX_SKIP_GIT_CHECK_FLAG.into(),
        CODEX_CWD_FLAG.into(),
        working_directory.as_os_str().to_os_string(),
    ]
}

#[async_trait]
impl TaskRunner for CodexRunner {
    async fn run(&self, task: &Task, config: &DispatchConfig) -> Result<()> {
        let program = config.executable_path();
        let command_name = program.display().to_string();

        let mut cmd = Command::new(program);
        cmd.args(codex_args(task.output_path(), config.working_directory()))
            .current_dir(config.working_directory())
            .stdin(Stdio::piped())
            .kill_on_drop(true);
        configure_stdio(&mut cmd, config.child_output());

        tracing::debug!(
            command = %command_name,
            output = %task.output_path().display(),
            prompt_bytes = task.prompt().len(),
            "Spawning codex"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::process_spawn(&command_name, e))?;

        let stdin = child.stdin.take();
        let (written, waited) = tokio::join!(
            write_prompt(stdin, task.prompt()),
            child.wait_with_output()
        );

        let output = waited.map_err(|e| {
            Error::process_execution(&command_name, None, format!("failed to wait for process: {e}"))
        })?;

        if !output.status.success() {
            return Err(Error::process_execution(
                &command_name,
                output.status.code(),
                failure_message(&output.status, &output.stderr),
            ));
        }

        match written {
            Ok(()) => Ok(()),
            // The child exited 0 without reading all of its input; its exit
            // status is the only success signal.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!(command = %command_name, "codex closed stdin early");
                Ok(())
            }
            Err(e) => Err(Error::process_execution(
                &command_name,
                output.status.code(),
                format!("failed to write prompt to stdin: {e}"),
            )),
        }
    }
}

fn configure_stdio(cmd: &mut Command, child_output: ChildOutput) {
    match child_output {
        ChildOutput::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        ChildOutput::Capture => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
    }
}

/// Write the whole prompt and close the pipe so the child sees EOF
async fn write_prompt(stdin: Option<ChildStdin>, prompt: &str) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    stdin.write_all(prompt.as_bytes()).await?;
    stdin.shutdown().await?;
    drop(stdin);
    Ok(())
}

fn failure_message(status: &ExitStatus, stderr: &[u8]) -> String {
    let mut parts = Vec::new();

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            parts.push(format!("killed by signal {signal}"));
        }
    }
    #[cfg(not(unix))]
    let _ = status;

    let tail = stderr_tail(stderr);
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts.join(": ")
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
