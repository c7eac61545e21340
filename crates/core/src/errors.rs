use std::path::PathBuf;

use crate::types::TaskFailureKind;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dispatch operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Startup configuration errors (bad arguments, unresolvable executable)
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations performed before dispatch begins
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// An input file could not be read or is not valid UTF-8
    #[error("failed to read input '{path}': {source}")]
    TaskRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external executable could not be launched
    #[error("failed to spawn '{command}': {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external executable ran but did not exit cleanly
    #[error("{}", format_execution_error(.command, .exit_code, .message))]
    ProcessExecution {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// The external executable exited 0 without writing its output file
    #[error("process exited successfully but did not write '{path}'")]
    MissingOutput { path: PathBuf },
}

fn format_execution_error(command: &str, exit_code: &Option<i32>, message: &str) -> String {
    let head = match exit_code {
        Some(code) => format!("command '{command}' failed with exit code {code}"),
        None => format!("command '{command}' did not exit normally"),
    };
    if message.is_empty() {
        head
    } else {
        format!("{head}: {message}")
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create an input read error
    #[must_use]
    pub fn task_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::TaskRead {
            path: path.into(),
            source,
        }
    }

    /// Create a process spawn error
    #[must_use]
    pub fn process_spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Error::ProcessSpawn {
            command: command.into(),
            source,
        }
    }

    /// Create a process execution error
    #[must_use]
    pub fn process_execution(
        command: impl Into<String>,
        exit_code: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Error::ProcessExecution {
            command: command.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a missing output error
    #[must_use]
    pub fn missing_output(path: impl Into<PathBuf>) -> Self {
        Error::MissingOutput { path: path.into() }
    }

    /// Whether this error aborts the run before any task is dispatched
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration { .. } | Error::FileSystem { .. })
    }

    /// The per-task failure category, or `None` for startup errors
    pub fn failure_kind(&self) -> Option<TaskFailureKind> {
        match self {
            Error::TaskRead { .. } => Some(TaskFailureKind::Read),
            Error::ProcessSpawn { .. } => Some(TaskFailureKind::Spawn),
            Error::ProcessExecution { .. } => Some(TaskFailureKind::Execution),
            Error::MissingOutput { .. } => Some(TaskFailureKind::MissingOutput),
            Error::Configuration { .. } | Error::FileSystem { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_execution_error_message_includes_exit_code() {
        let err = Error::process_execution("codex", Some(3), "");
        assert_eq!(err.to_string(), "command 'codex' failed with exit code 3");

        let err = Error::process_execution("codex", None, "boom");
        assert_eq!(
            err.to_string(),
            "command 'codex' did not exit normally: boom"
        );
    }

    #[test]
    fn test_fatal_and_per_task_errors_are_disjoint() {
        let fatal = [
            Error::configuration("no codex"),
            Error::file_system("/tmp/x", "read", io::Error::other("nope")),
        ];
        for err in &fatal {
            assert!(err.is_fatal());
            assert!(err.failure_kind().is_none());
        }

        let per_task = [
            (
                Error::task_read("a.txt", io::Error::other("bad")),
                TaskFailureKind::Read,
            ),
            (
                Error::process_spawn("codex", io::Error::from(io::ErrorKind::NotFound)),
                TaskFailureKind::Spawn,
            ),
            (
                Error::process_execution("codex", Some(1), ""),
                TaskFailureKind::Execution,
            ),
            (Error::missing_output("out"), TaskFailureKind::MissingOutput),
        ];
        for (err, kind) in per_task {
            assert!(!err.is_fatal());
            assert_eq!(err.failure_kind(), Some(kind));
        }
    }
}
