use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use booker::{AttemptOrchestrator, BookingOutcome, CdpDriver, PageDriver, RunReport, SessionState};
use booker_runtime::{Browser, LaunchOptions};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::BookArgs;
use crate::config::{ResolvedConfig, resolve};
use crate::error::{CliError, Result};
use crate::output::{Artifact, ArtifactType, CommandResult, OutputFormat, ResultBuilder, TextOutput, print_result};
use crate::report::{Report, notify};

const DEFAULT_DEBUGGING_PORT: u16 = 9222;

/// Payload of a finished `book` run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookData {
	report: Report,
	#[serde(skip_serializing_if = "Option::is_none")]
	day: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	time: Option<String>,
	attempts: u64,
	delays: u64,
}

impl BookData {
	fn new(run: &RunReport) -> Self {
		let (day, time) = match &run.outcome {
			BookingOutcome::Booked { day, time, .. } | BookingOutcome::DryRun { day, time } => (Some(day.clone()), Some(time.clone())),
			BookingOutcome::Exhausted { .. } => (None, None),
		};
		Self {
			report: Report::from_outcome(&run.outcome),
			day,
			time,
			attempts: run.attempts,
			delays: run.delays,
		}
	}
}

impl TextOutput for BookData {
	fn render_text(&self) -> String {
		self.report.render_text()
	}
}

pub async fn execute(args: &BookArgs, format: OutputFormat) -> Result<ExitCode> {
	let reply = Reply::new(args, format);

	let resolved = match resolve(&args.config) {
		Ok(resolved) => resolved,
		Err(err) => return Err(reply.failure(err, None).await),
	};
	let browser = match open_browser(args).await {
		Ok(browser) => browser,
		Err(err) => return Err(reply.failure(err, None).await),
	};
	info!(target = "booker", launched = browser.is_launched(), "browser ready");
	let page = match browser.new_page().await {
		Ok(page) => page,
		Err(err) => return Err(reply.failure(err.into(), None).await),
	};

	let driver = CdpDriver::new(page)
		.with_selectors(resolved.selectors.clone())
		.with_navigation_timeout(Duration::from_millis(args.navigation_timeout));
	let code = match run(&driver, &resolved).await {
		Ok(report) => {
			reply.success(&report).await;
			Ok(if report.outcome.is_success() { ExitCode::SUCCESS } else { ExitCode::from(2) })
		}
		Err(err) => {
			let artifact = match &args.artifacts_dir {
				Some(dir) => save_failure_screenshot(&driver, dir).await,
				None => None,
			};
			Err(reply.failure(err, artifact).await)
		}
	};

	if let Err(err) = driver.page().close().await {
		warn!(target = "booker", error = %err, "failed to close page");
	}
	code
}

/// Final envelope and webhook report for one `book` invocation, timed from its start.
struct Reply<'a> {
	webhook_url: Option<&'a str>,
	format: OutputFormat,
	started: Instant,
}

impl<'a> Reply<'a> {
	fn new(args: &'a BookArgs, format: OutputFormat) -> Self {
		Self {
			webhook_url: args.webhook_url.as_deref(),
			format,
			started: Instant::now(),
		}
	}

	async fn success(&self, run: &RunReport) -> CommandResult<BookData> {
		let data = BookData::new(run);
		notify(self.webhook_url, &data.report).await;
		let result = ResultBuilder::started_at("book", self.started).data(data).build();
		print_result(&result, self.format);
		result
	}

	/// Reports `err` and hands it back for the exit path.
	async fn failure(&self, err: CliError, artifact: Option<Artifact>) -> CliError {
		notify(self.webhook_url, &Report::failure(&err)).await;
		let mut builder = ResultBuilder::<()>::started_at("book", self.started).error(err.code(), err.to_string());
		if let Some(artifact) = artifact {
			builder = builder.artifact(artifact);
		}
		let result: CommandResult<()> = builder.build();
		print_result(&result, self.format);
		err
	}
}

async fn run<D: PageDriver + ?Sized>(driver: &D, resolved: &ResolvedConfig) -> Result<RunReport> {
	let orchestrator = AttemptOrchestrator::new(driver, &resolved.criteria, &resolved.credentials)?;
	info!(
		target = "booker",
		url = orchestrator.urls().booking_url(),
		dry_run = resolved.criteria.dry_run(),
		"starting booking run"
	);
	let mut session = SessionState::new();
	Ok(orchestrator.run(&mut session).await?)
}

async fn open_browser(args: &BookArgs) -> Result<Browser> {
	if args.launch {
		let options = LaunchOptions {
			port: args.port,
			headless: args.headless,
			executable: args.chrome.clone(),
			user_data_dir: None,
		};
		return Ok(Browser::launch(&options).await?);
	}

	match &args.cdp_endpoint {
		Some(endpoint) => Ok(Browser::connect(endpoint).await?),
		None => Ok(Browser::discover(args.port.unwrap_or(DEFAULT_DEBUGGING_PORT)).await?),
	}
}

async fn save_failure_screenshot<D: PageDriver + ?Sized>(driver: &D, dir: &Path) -> Option<Artifact> {
	let bytes = match driver.capture_screenshot().await {
		Ok(Some(bytes)) => bytes,
		Ok(None) => return None,
		Err(err) => {
			warn!(target = "booker", error = %err, "failure screenshot not captured");
			return None;
		}
	};

	let path = screenshot_path(dir);
	let written = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, &bytes));
	match written {
		Ok(()) => {
			info!(target = "booker", path = %path.display(), "failure screenshot saved");
			Some(Artifact {
				artifact_type: ArtifactType::Screenshot,
				path,
				size_bytes: Some(bytes.len() as u64),
			})
		}
		Err(err) => {
			warn!(target = "booker", error = %err, path = %path.display(), "failure screenshot not written");
			None
		}
	}
}

fn screenshot_path(dir: &Path) -> PathBuf {
	let stamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
	dir.join(format!("booking-failure-{stamp}.png"))
}
