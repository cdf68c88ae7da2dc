mod commands;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ocli_utils::cli::CliArgs;
use ocli_utils::notification::Notification;

use crate::commands::Printer;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Also installs the bridge that forwards `log` records from the library crates.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let args = CliArgs::parse();
    let out = Printer::new(io::stdout().is_terminal());

    match commands::run(args, &out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let line = Notification::error(format!("{:#}", e)).render(io::stderr().is_terminal());
            eprintln!("{}", line);
            ExitCode::FAILURE
        }
    }
}
