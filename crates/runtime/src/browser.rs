//! Connected browser that hands out page targets.

use std::sync::Arc;

use tracing::info;

use crate::connection::Connection;
use crate::discovery::{discover_chrome, resolve_ws_endpoint};
use crate::error::{Error, Result};
use crate::launcher::{ChromeProcess, LaunchOptions, launch_chrome};
use crate::page::CdpPage;

/// A browser reachable over its debugger WebSocket.
///
/// When the browser was launched by [`Browser::launch`] the process is owned
/// here and terminated when the browser is dropped.
pub struct Browser {
	connection: Arc<Connection>,
	process: Option<ChromeProcess>,
}

impl Browser {
	/// Attaches to an existing browser by `ws://` or `http://` endpoint.
	pub async fn connect(endpoint: &str) -> Result<Self> {
		let ws = resolve_ws_endpoint(endpoint).await?;
		info!(target = "booker.cdp", endpoint = %ws, "attaching to browser");
		Ok(Self {
			connection: Connection::connect(&ws).await?,
			process: None,
		})
	}

	/// Attaches to a browser debugging on a local `port`.
	pub async fn discover(port: u16) -> Result<Self> {
		let info = discover_chrome(port).await?;
		Self::connect(&info.web_socket_debugger_url).await
	}

	/// Launches a local browser and connects to it.
	pub async fn launch(options: &LaunchOptions) -> Result<Self> {
		let process = launch_chrome(options).await?;
		info!(target = "booker.cdp", port = process.port(), "browser launched");
		let connection = Connection::connect(process.ws_endpoint()).await?;
		Ok(Self {
			connection,
			process: Some(process),
		})
	}

	pub async fn new_page(&self) -> Result<CdpPage> {
		if !self.connection.is_open() {
			return Err(Error::ChannelClosed);
		}
		let page = CdpPage::open(Arc::clone(&self.connection)).await?;
		info!(target = "booker.cdp", target_id = page.target_id(), "page opened");
		Ok(page)
	}

	/// Returns `true` when this handle owns the browser process.
	pub fn is_launched(&self) -> bool {
		self.process.is_some()
	}
}
