/// Constants used throughout the codex-dispatch codebase
// External executable discovery
pub const CODEX_BINARY_NAME: &str = "codex";
pub const CODEX_BINARY_PATTERN: &str = "codex";

// Output naming
pub const OUTPUT_SUFFIX: &str = "-codex";

// Separator between the template and each input file's contents
pub const PROMPT_SEPARATOR: &str = "\n";

// Fixed flags passed to `codex`
pub const CODEX_EXEC_SUBCOMMAND: &str = "exec";
pub const CODEX_OUTPUT_FLAG: &str = "--output-last-message";
pub const CODEX_BYPASS_FLAG: &str = "--dangerously-bypass-approvals-and-sandbox";
pub const CODEX_SKIP_GIT_CHECK_FLAG: &str = "--skip-git-repo-check";
pub const CODEX_CWD_FLAG: &str = "-C";

// Environment variable names
pub const DISPATCH_LOG_VAR: &str = "DISPATCH_LOG";

// Number of trailing stderr bytes kept for failure details in capture mode
pub const STDERR_TAIL_BYTES: usize = 2048;

// Process exit codes
pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_TASKS_FAILED: i32 = 1;
pub const EXIT_CONFIGURATION: i32 = 3;
