//! Task building and parallel dispatch for codex-dispatch
//!
//! - **`builder`**: discovers input files and turns them into tasks
//! - **`runner`**: runs one external codex process for one task
//! - **`executor`**: runs many tasks under a fixed worker limit
//! - **`report`**: per-task event sinks used by the executor

pub mod builder;
pub mod executor;
pub mod report;
pub mod runner;

pub use builder::{
    build_tasks, compose_prompt, discover_inputs, output_path_for, plan_tasks, PendingTask,
};
pub use executor::{execute, DispatchExecutor};
pub use report::{CollectingReporter, DispatchEvent, DispatchReporter, TracingReporter};
pub use runner::{codex_args, CodexRunner, TaskRunner};
