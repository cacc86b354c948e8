use std::process::ExitCode;

use booker_cli::cli::Cli;
use booker_cli::{commands, logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match commands::dispatch(cli).await {
		Ok(code) => code,
		Err(err) => {
			error!(target = "booker", error = %err, "command failed");
			ExitCode::FAILURE
		}
	}
}
