mod book;
mod check;

use std::process::ExitCode;

use crate::cli::{Cli, Commands};
use crate::error::Result;

/// Runs the selected command. Exhausted retries exit with status 2.
pub async fn dispatch(cli: Cli) -> Result<ExitCode> {
	match cli.command {
		Commands::Book(args) => book::execute(&args, cli.format).await,
		Commands::Check { config } => check::execute(&config, cli.format).map(|()| ExitCode::SUCCESS),
	}
}
