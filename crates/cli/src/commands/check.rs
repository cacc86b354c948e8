use std::time::Instant;

use tracing::info;

use crate::cli::ConfigArgs;
use crate::config::{ConfigSummary, resolve};
use crate::error::Result;
use crate::output::{CommandResult, OutputFormat, ResultBuilder, print_result};

pub fn execute(args: &ConfigArgs, format: OutputFormat) -> Result<()> {
	let started = Instant::now();
	info!(target = "booker", path = %args.config.display(), "check config");

	let summary = resolve(args).and_then(|resolved| ConfigSummary::new(&resolved));
	match summary {
		Ok(summary) => {
			print_result(&ResultBuilder::started_at("check", started).data(summary).build(), format);
			Ok(())
		}
		Err(err) => {
			let result: CommandResult<()> = ResultBuilder::started_at("check", started).error(err.code(), err.to_string()).build();
			print_result(&result, format);
			Err(err)
		}
	}
}
