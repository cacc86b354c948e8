//! Debugger endpoint discovery via the DevTools HTTP interface.

use std::time::Duration;

use booker_protocol::VersionInfo;
use tracing::debug;

use crate::error::{Error, Result};

const VERSION_FETCH_TIMEOUT: Duration = Duration::from_millis(400);

/// Resolves `/json/version` metadata from a browser listening on `port`.
pub async fn fetch_version(port: u16) -> Result<VersionInfo> {
	let mut last_error = "no response".to_string();

	for base in [
		format!("http://127.0.0.1:{port}"),
		format!("http://localhost:{port}"),
		format!("http://[::1]:{port}"),
	] {
		match fetch_version_from(&base).await {
			Ok(info) => return Ok(info),
			Err(err) => last_error = err.to_string(),
		}
	}

	Err(Error::Discovery(format!("Failed to reach port {port}: {last_error}")))
}

/// Resolves `/json/version` metadata from an explicit HTTP base URL.
pub async fn fetch_version_from(base: &str) -> Result<VersionInfo> {
	let client = reqwest::Client::builder()
		.timeout(VERSION_FETCH_TIMEOUT)
		.build()
		.map_err(|e| Error::Discovery(format!("Failed to create HTTP client: {e}")))?;

	let url = format!("{}/json/version", base.trim_end_matches('/'));
	let response = client
		.get(&url)
		.send()
		.await
		.map_err(|e| Error::Discovery(format!("{url}: {e}")))?;

	if !response.status().is_success() {
		return Err(Error::Discovery(format!("{url}: unexpected status {}", response.status())));
	}

	response
		.json::<VersionInfo>()
		.await
		.map_err(|e| Error::Discovery(format!("Failed to parse {url}: {e}")))
}

/// Turns a user-supplied endpoint into a WebSocket debugger URL.
///
/// `ws://`/`wss://` URLs are used as-is; `http://` URLs are resolved through `/json/version`.
pub async fn resolve_ws_endpoint(endpoint: &str) -> Result<String> {
	if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
		return Ok(endpoint.to_string());
	}
	if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
		let info = fetch_version_from(endpoint).await?;
		debug!(
			target = "booker.cdp",
			browser = ?info.browser,
			ws = %info.web_socket_debugger_url,
			"resolved debugger endpoint"
		);
		return Ok(info.web_socket_debugger_url);
	}
	Err(Error::Discovery(format!(
		"Unsupported endpoint '{endpoint}'; expected ws://, wss://, or http:// URL"
	)))
}

/// Discovers an already-running debug browser on `port`.
pub async fn discover_chrome(port: u16) -> Result<VersionInfo> {
	fetch_version(port).await.map_err(|e| {
		Error::Discovery(format!(
			"No Chrome instance with remote debugging found on port {port}.\n\
			 Last error: {e}\n\
			 Try running: google-chrome --remote-debugging-port={port}\n\
			 Or use: booker book --launch"
		))
	})
}
