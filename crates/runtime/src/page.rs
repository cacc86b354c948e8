//! A single attached page target and the frames inside it.
//!
//! Child frames are reached without relaxing web security. A frame hosted in
//! its own process is an `iframe` target and gets its own flattened session;
//! a frame sharing the page's renderer is addressed through an isolated world
//! created in it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use booker_protocol::{
	AttachToTargetResult, CaptureScreenshotResult, CreateIsolatedWorldResult, CreateTargetResult, EvaluateResult, Frame,
	GetFrameTreeResult, GetTargetsResult, NavigateResult,
};
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::debug;

use crate::connection::Connection;
use crate::error::{Error, Result};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const ISOLATED_WORLD: &str = "booker";

/// Where a script runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameScope {
	/// The page's top-level document.
	Main,
	/// A same-process child frame, via an isolated world's execution context.
	Context(i64),
	/// An out-of-process child frame, via its own session.
	Session(String),
}

/// Page target attached through a flattened CDP session.
pub struct CdpPage {
	connection: Arc<Connection>,
	target_id: String,
	session_id: String,
	/// Sessions attached to out-of-process frames, by target id.
	frame_sessions: Mutex<HashMap<String, String>>,
}

impl CdpPage {
	/// Creates a blank page target and attaches to it.
	pub async fn open(connection: Arc<Connection>) -> Result<Self> {
		let created: CreateTargetResult =
			serde_json::from_value(connection.send_command(None, "Target.createTarget", json!({ "url": "about:blank" })).await?)?;
		let attached: AttachToTargetResult = serde_json::from_value(
			connection
				.send_command(None, "Target.attachToTarget", json!({ "targetId": created.target_id, "flatten": true }))
				.await?,
		)?;

		let page = Self {
			connection,
			target_id: created.target_id,
			session_id: attached.session_id,
			frame_sessions: Mutex::new(HashMap::new()),
		};
		page.call("Page.enable", json!({})).await?;
		page.call("Runtime.enable", json!({})).await?;

		debug!(target = "booker.cdp", target_id = %page.target_id, "page attached");
		Ok(page)
	}

	pub fn target_id(&self) -> &str {
		&self.target_id
	}

	async fn call(&self, method: &str, params: Value) -> Result<Value> {
		self.connection.send_command(Some(&self.session_id), method, params).await
	}

	/// Navigates and waits until `document.readyState` is `complete`.
	pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
		let result: NavigateResult = serde_json::from_value(self.call("Page.navigate", json!({ "url": url })).await?)?;
		if let Some(reason) = result.error_text {
			return Err(Error::Navigation { url: url.to_string(), reason });
		}

		let start = Instant::now();
		loop {
			// The old document can still answer during the swap; errors here are transient.
			if let Ok(Value::String(state)) = self.evaluate("document.readyState").await {
				if state == "complete" {
					return Ok(());
				}
			}
			if start.elapsed() >= timeout {
				return Err(Error::Timeout {
					what: format!("load of {url}"),
					timeout,
				});
			}
			tokio::time::sleep(READY_POLL_INTERVAL).await;
		}
	}

	/// Evaluates `expression` in the page and returns its JSON value.
	///
	/// Promises are awaited; thrown exceptions become [`Error::Script`].
	pub async fn evaluate(&self, expression: &str) -> Result<Value> {
		self.evaluate_in(&FrameScope::Main, expression).await
	}

	/// Like [`CdpPage::evaluate`], inside the frame `scope` designates.
	pub async fn evaluate_in(&self, scope: &FrameScope, expression: &str) -> Result<Value> {
		let mut params = json!({
			"expression": expression,
			"returnByValue": true,
			"awaitPromise": true,
		});
		let session = match scope {
			FrameScope::Main => self.session_id.as_str(),
			FrameScope::Context(context) => {
				params["contextId"] = json!(context);
				self.session_id.as_str()
			}
			FrameScope::Session(session) => session.as_str(),
		};

		let raw = match self.connection.send_command(Some(session), "Runtime.evaluate", params).await {
			Ok(raw) => raw,
			Err(err) => {
				if let FrameScope::Session(session) = scope {
					// The frame's target is gone; attach afresh next time.
					self.frame_sessions.lock().retain(|_, attached| attached != session);
				}
				return Err(err);
			}
		};
		let result: EvaluateResult = serde_json::from_value(raw)?;
		if let Some(details) = result.exception_details {
			return Err(Error::Script(details.message().to_string()));
		}
		Ok(result.result.value.unwrap_or(Value::Null))
	}

	/// Finds the child frame whose `<iframe>` element matches `selector`.
	///
	/// Returns `None` while no such element exists or its document is not
	/// reachable yet.
	pub async fn resolve_frame(&self, selector: &str) -> Result<Option<FrameScope>> {
		let script = format!(
			"(() => {{ const frame = document.querySelector({}); return frame ? frame.src : null; }})()",
			serde_json::to_string(selector)?
		);
		let src = match self.evaluate(&script).await? {
			Value::String(src) if !src.is_empty() => src,
			_ => return Ok(None),
		};

		let targets: GetTargetsResult = serde_json::from_value(self.connection.send_command(None, "Target.getTargets", json!({})).await?)?;
		let frame_targets: Vec<_> = targets.target_infos.iter().filter(|info| info.kind == "iframe").collect();
		let remote = frame_targets
			.iter()
			.find(|info| info.url == src)
			.or_else(|| frame_targets.iter().find(|info| same_origin(&info.url, &src)));
		if let Some(info) = remote {
			return Ok(Some(FrameScope::Session(self.frame_session(&info.target_id).await?)));
		}

		let tree: GetFrameTreeResult = serde_json::from_value(self.call("Page.getFrameTree", json!({})).await?)?;
		let local = tree
			.frame_tree
			.find_child(&|frame: &Frame| frame.url == src)
			.or_else(|| tree.frame_tree.find_child(&|frame: &Frame| same_origin(&frame.url, &src)));
		let Some(frame) = local else {
			debug!(target = "booker.cdp", selector, %src, "frame not attached yet");
			return Ok(None);
		};

		let world: CreateIsolatedWorldResult = serde_json::from_value(
			self.call("Page.createIsolatedWorld", json!({ "frameId": frame.id, "worldName": ISOLATED_WORLD }))
				.await?,
		)?;
		Ok(Some(FrameScope::Context(world.execution_context_id)))
	}

	async fn frame_session(&self, target_id: &str) -> Result<String> {
		if let Some(session) = self.frame_sessions.lock().get(target_id) {
			return Ok(session.clone());
		}
		let attached: AttachToTargetResult = serde_json::from_value(
			self.connection
				.send_command(None, "Target.attachToTarget", json!({ "targetId": target_id, "flatten": true }))
				.await?,
		)?;
		debug!(target = "booker.cdp", target_id, session = %attached.session_id, "frame attached");
		self.frame_sessions
			.lock()
			.insert(target_id.to_string(), attached.session_id.clone());
		Ok(attached.session_id)
	}

	/// Inserts text into the focused element as if typed.
	pub async fn insert_text(&self, text: &str) -> Result<()> {
		self.insert_text_in(&FrameScope::Main, text).await
	}

	/// Inserts text into the element focused inside `scope`.
	pub async fn insert_text_in(&self, scope: &FrameScope, text: &str) -> Result<()> {
		let session = match scope {
			FrameScope::Session(session) => session.as_str(),
			FrameScope::Main | FrameScope::Context(_) => self.session_id.as_str(),
		};
		self.connection
			.send_command(Some(session), "Input.insertText", json!({ "text": text }))
			.await
			.map(|_| ())
	}

	/// Captures the viewport as PNG bytes.
	pub async fn capture_screenshot(&self) -> Result<Vec<u8>> {
		let result: CaptureScreenshotResult = serde_json::from_value(self.call("Page.captureScreenshot", json!({ "format": "png" })).await?)?;
		Ok(STANDARD.decode(result.data)?)
	}

	pub async fn close(&self) -> Result<()> {
		self.connection
			.send_command(None, "Target.closeTarget", json!({ "targetId": self.target_id }))
			.await
			.map(|_| ())
	}
}

fn same_origin(a: &str, b: &str) -> bool {
	match (Url::parse(a), Url::parse(b)) {
		(Ok(a), Ok(b)) => a.origin().is_tuple() && a.origin() == b.origin(),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn origins_compare_scheme_host_and_port() {
		assert!(same_origin("https://pay.example/cvv?x=1", "https://pay.example/other"));
		assert!(!same_origin("https://pay.example/cvv", "https://pay.example:8443/cvv"));
		assert!(!same_origin("https://pay.example/cvv", "http://pay.example/cvv"));
		assert!(!same_origin("about:blank", "about:blank"));
	}
}
