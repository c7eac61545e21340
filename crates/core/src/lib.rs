//! Core domain types, errors, and constants for `codex-dispatch`.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias. Startup failures are
//!   fatal; read, spawn and execution failures are scoped to one task.
//! - **`types`**: `Task`, `PendingTask`, `DispatchConfig` and the result types
//!   produced by a dispatch run.
//! - **`constants`**: fixed names, flags and exit codes.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
