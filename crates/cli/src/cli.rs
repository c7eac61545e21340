use clap::Parser;
use dispatch_core::{ChildOutput, OutputCheck};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "codex-dispatch")]
#[command(about = "Run codex over every file in a directory, in parallel", long_about = None)]
#[command(version)]
pub struct Cli {
    /// File whose contents prefix every prompt
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Directory of input files (not searched recursively)
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Directory for `<input>-codex` result files, created if missing
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Maximum number of codex processes running at once
    #[arg(value_name = "WORKERS")]
    pub workers: NonZeroUsize,

    /// Working directory passed to codex (defaults to the current directory)
    #[arg(short = 'C', long = "cd", value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Path to the codex executable (skips PATH and local lookup)
    #[arg(long = "codex", value_name = "PATH")]
    pub codex: Option<PathBuf>,

    /// Fail a task when codex exits 0 without writing its output file
    #[arg(long)]
    pub require_output: bool,

    /// Capture codex stdout/stderr instead of passing them through
    #[arg(long)]
    pub capture_output: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_check(&self) -> OutputCheck {
        if self.require_output {
            OutputCheck::RequireFile
        } else {
            OutputCheck::Trust
        }
    }

    pub fn child_output(&self) -> ChildOutput {
        if self.capture_output {
            ChildOutput::Capture
        } else {
            ChildOutput::Inherit
        }
    }
}
