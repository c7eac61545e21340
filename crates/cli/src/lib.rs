//! `codex-dispatch`: run codex over every file in a directory.
//!
//! The binary is a thin wrapper: [`cli::Cli`] parses arguments,
//! [`run::prepare`] resolves them into a `DispatchConfig` and a task list,
//! and [`run::run`] hands both to the executor in `dispatch-task`.

pub mod cli;
pub mod resolve;
pub mod run;

pub use cli::Cli;
pub use resolve::{resolve_executable, resolve_executable_in};
pub use run::{prepare, run, write_summary, Prepared};
