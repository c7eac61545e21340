use dispatch_core::DISPATCH_LOG_VAR;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter is read from `DISPATCH_LOG`, then `RUST_LOG`, and otherwise
/// defaults to `info` (`debug` when `verbose` is set). Events go to stderr so
/// that anything the child process inherits on stdout stays clean.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };

    std::env::var(DISPATCH_LOG_VAR)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for a single task
pub fn task_span(input: &Path) -> Span {
    span!(Level::INFO, "task", input = %input.display())
}

/// Create a span for the whole dispatch run
pub fn dispatch_span(total_tasks: usize, workers: usize) -> Span {
    span!(Level::INFO, "dispatch", total_tasks = %total_tasks, workers = %workers)
}

/// Emit a structured event for task completion
pub fn task_completed(input: &Path, output: &Path, duration_ms: u64) {
    info!(
        input = %input.display(),
        output = %output.display(),
        duration_ms = %duration_ms,
        "task_completed"
    );
}

/// Emit a structured event for a task failure
pub fn task_failed(input: &Path, kind: &str, detail: &str, duration_ms: u64) {
    error!(
        input = %input.display(),
        kind = %kind,
        error = %detail,
        duration_ms = %duration_ms,
        "task_failed"
    );
}
