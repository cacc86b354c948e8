//! Chromium discovery and launch with remote debugging enabled.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use booker_protocol::VersionInfo;
use tracing::{debug, info};

use crate::discovery::fetch_version;
use crate::error::{Error, Result};
use crate::process::{pick_debugging_port, scratch_profile_dir};

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);
const STARTUP_ATTEMPTS: usize = 40;

/// Options for launching a local Chromium.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
	/// Preferred remote-debugging port; an ephemeral port is used when busy or unset.
	pub port: Option<u16>,
	/// Run without a visible window.
	pub headless: bool,
	/// Explicit executable; searched on `PATH` and well-known locations when unset.
	pub executable: Option<PathBuf>,
	/// Profile directory; a per-port scratch directory when unset.
	pub user_data_dir: Option<PathBuf>,
}

/// A Chromium process started by [`launch_chrome`]. Killed on drop.
#[derive(Debug)]
pub struct ChromeProcess {
	child: Child,
	port: u16,
	version: VersionInfo,
}

impl ChromeProcess {
	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn ws_endpoint(&self) -> &str {
		&self.version.web_socket_debugger_url
	}
}

impl Drop for ChromeProcess {
	fn drop(&mut self) {
		let _ = self.child.kill();
		let _ = self.child.wait();
	}
}

/// Launches Chromium and waits until its debugger endpoint answers.
pub async fn launch_chrome(options: &LaunchOptions) -> Result<ChromeProcess> {
	let executable = match &options.executable {
		Some(path) => path.clone(),
		None => find_chrome_executable()
			.ok_or_else(|| Error::Launch("Could not find a Chrome/Chromium executable; pass --chrome <path>".into()))?,
	};
	let port = pick_debugging_port(options.port)?;
	let profile = options.user_data_dir.clone().unwrap_or_else(|| scratch_profile_dir(port));

	let args = launch_args(port, &profile, options.headless);
	info!(target = "booker.cdp", executable = %executable.display(), port, headless = options.headless, "launching browser");

	let mut child = Command::new(&executable)
		.args(&args)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.spawn()
		.map_err(|e| Error::Launch(format!("Failed to start {}: {e}", executable.display())))?;

	let mut last_error = "endpoint not reachable".to_string();
	for _ in 0..STARTUP_ATTEMPTS {
		tokio::time::sleep(STARTUP_POLL_INTERVAL).await;

		if let Ok(Some(status)) = child.try_wait() {
			return Err(Error::Launch(format!(
				"Browser exited before its debugging endpoint became available (status: {status})"
			)));
		}

		match fetch_version(port).await {
			Ok(version) => {
				debug!(target = "booker.cdp", port, ws = %version.web_socket_debugger_url, "browser ready");
				return Ok(ChromeProcess { child, port, version });
			}
			Err(err) => last_error = err.to_string(),
		}
	}

	let _ = child.kill();
	Err(Error::Launch(format!(
		"Browser launched but debugging endpoint not available on port {port}: {last_error}"
	)))
}

fn launch_args(port: u16, profile: &Path, headless: bool) -> Vec<String> {
	let mut args = vec![
		format!("--remote-debugging-port={port}"),
		format!("--user-data-dir={}", profile.display()),
		"--no-first-run".to_string(),
		"--no-default-browser-check".to_string(),
	];
	if headless {
		args.push("--headless=new".to_string());
	}
	args.push("about:blank".to_string());
	args
}

fn find_chrome_executable() -> Option<PathBuf> {
	let candidates: &[&str] = if cfg!(target_os = "macos") {
		&[
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
		]
	} else if cfg!(target_os = "windows") {
		&["chrome.exe", "msedge.exe", "brave.exe"]
	} else {
		&[
			"google-chrome-stable",
			"google-chrome",
			"chromium-browser",
			"chromium",
			"brave-browser",
			"/snap/bin/chromium",
		]
	};

	candidates.iter().find_map(|candidate| {
		let path = Path::new(candidate);
		if path.is_absolute() {
			path.exists().then(|| path.to_path_buf())
		} else {
			which::which(candidate).ok()
		}
	})
}
