use clap::Parser;
use codex_dispatch::Cli;
use dispatch_core::{EXIT_CONFIGURATION, EXIT_TASKS_FAILED};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Err(e) = dispatch_utils::init(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    match codex_dispatch::run(cli).await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            let code = if e.is_fatal() {
                EXIT_CONFIGURATION
            } else {
                EXIT_TASKS_FAILED
            };
            let report = eyre::Report::new(e).wrap_err("dispatch aborted");
            eprintln!("{report:?}");
            std::process::exit(code);
        }
    }
}
