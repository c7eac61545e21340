//! Core domain types for the dispatcher.
//!
//! - **`task`**: a unit of work, one per input file
//! - **`config`**: run-wide, read-only dispatch settings
//! - **`outcome`**: per-task results and the aggregated run report

pub mod config;
pub mod outcome;
pub mod task;

pub use config::*;
pub use outcome::*;
pub use task::*;
