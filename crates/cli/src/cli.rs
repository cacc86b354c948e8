use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

pub const DEFAULT_CONFIG_PATH: &str = "booker.json";

#[derive(Parser, Debug)]
#[command(name = "booker")]
#[command(about = "Books a restaurant reservation as soon as a matching slot opens")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format for the final report
	#[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run booking attempts until a reservation is made or retries run out
	Book(BookArgs),

	/// Validate configuration and print the resolved criteria
	Check {
		#[command(flatten)]
		config: ConfigArgs,
	},
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
	/// Reservation configuration file (JSON)
	#[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
	pub config: PathBuf,

	/// Patron email; overrides the config file
	#[arg(long, env = "BOOKER_EMAIL", hide_env_values = true)]
	pub email: Option<String>,

	/// Patron password; overrides the config file
	#[arg(long, env = "BOOKER_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,

	/// Card verification code; overrides the config file
	#[arg(long, env = "BOOKER_CVV", hide_env_values = true)]
	pub cvv: Option<String>,

	/// Fill in checkout but stop before purchase
	#[arg(long)]
	pub dry_run: bool,

	/// Retries after the first attempt
	#[arg(long, value_name = "N")]
	pub retry_attempts: Option<u32>,

	/// Delay between attempts in milliseconds
	#[arg(long, value_name = "MS")]
	pub retry_delay: Option<u64>,
}

#[derive(Args, Debug)]
pub struct BookArgs {
	#[command(flatten)]
	pub config: ConfigArgs,

	/// Attach to a running browser (ws:// or http:// DevTools endpoint)
	#[arg(long, value_name = "URL", conflicts_with = "port")]
	pub cdp_endpoint: Option<String>,

	/// Attach to a browser debugging on this local port, or launch on it with --launch
	#[arg(long)]
	pub port: Option<u16>,

	/// Launch a local Chromium instead of attaching
	#[arg(long, conflicts_with = "cdp_endpoint")]
	pub launch: bool,

	/// Launch without a visible window
	#[arg(long, requires = "launch")]
	pub headless: bool,

	/// Chromium executable to launch
	#[arg(long, value_name = "PATH", requires = "launch")]
	pub chrome: Option<PathBuf>,

	/// Chat webhook that receives the final report
	#[arg(long, value_name = "URL", env = "BOOKER_WEBHOOK_URL")]
	pub webhook_url: Option<String>,

	/// Page load timeout in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 30_000)]
	pub navigation_timeout: u64,

	/// Directory for failure screenshots
	#[arg(long, value_name = "DIR")]
	pub artifacts_dir: Option<PathBuf>,
}
