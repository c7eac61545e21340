//! Shared utilities for codex-dispatch
//!
//! Currently this is the tracing subscriber setup and the span and event
//! helpers the dispatcher uses for structured logging.

pub mod tracing;

pub use self::tracing::*;
