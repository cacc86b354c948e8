//! [`PageDriver`] backed by a Chromium page over the DevTools protocol.
//!
//! Queries run a small script that tags each match with a page-unique
//! `data-booker-handle` attribute and returns [`ElementSnapshot`]s; clicks and
//! typing look the element up again by that tag. The tag counter lives in the
//! DOM so every execution context over one document shares it. Locators inside an iframe run
//! in that frame's own document, found through the page's frame targets.

use std::time::Duration;

use async_trait::async_trait;
use booker_protocol::ElementSnapshot;
use booker_runtime::{CdpPage, FrameScope};
use serde_json::Value;
use tracing::{debug, trace};

use super::{ElementHandle, PageDriver};
use crate::error::{Error, Result};
use crate::selectors::{SelectorKey, Selectors};

const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CdpDriver {
	page: CdpPage,
	selectors: Selectors,
	navigation_timeout: Duration,
}

impl CdpDriver {
	pub fn new(page: CdpPage) -> Self {
		Self {
			page,
			selectors: Selectors::default(),
			navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
		}
	}

	pub fn with_selectors(mut self, selectors: Selectors) -> Self {
		self.selectors = selectors;
		self
	}

	pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
		self.navigation_timeout = timeout;
		self
	}

	pub fn page(&self) -> &CdpPage {
		&self.page
	}

	/// Frame `key` lives in; `None` while its iframe is not reachable.
	async fn scope(&self, key: SelectorKey) -> Result<Option<FrameScope>> {
		match &self.selectors.get(key).frame {
			Some(frame) => Ok(self.page.resolve_frame(frame).await?),
			None => Ok(Some(FrameScope::Main)),
		}
	}

	/// Runs `body` with `el` bound to the tagged element in `scope`.
	async fn with_element(&self, scope: &FrameScope, element: &ElementHandle, body: &str) -> Result<()> {
		match self.page.evaluate_in(scope, &element_script(element.id, body)).await? {
			Value::Bool(true) => Ok(()),
			_ => Err(not_found(element)),
		}
	}
}

#[async_trait]
impl PageDriver for CdpDriver {
	async fn navigate(&self, url: &str) -> Result<()> {
		debug!(target = "booker.cdp", target_id = self.page.target_id(), %url, "navigate");
		Ok(self.page.navigate(url, self.navigation_timeout).await?)
	}

	async fn query_elements(&self, key: SelectorKey) -> Result<Vec<ElementHandle>> {
		let Some(scope) = self.scope(key).await? else {
			return Ok(Vec::new());
		};
		let script = query_script(&self.selectors.get(key).css)?;
		let value = match self.page.evaluate_in(&scope, &script).await {
			Ok(value) => value,
			// A child frame mid-navigation has no document to query yet.
			Err(err) if scope != FrameScope::Main => {
				debug!(target = "booker.cdp", %key, error = %err, "frame query failed");
				return Ok(Vec::new());
			}
			Err(err) => return Err(err.into()),
		};
		let snapshots: Vec<ElementSnapshot> = serde_json::from_value(value)?;
		trace!(target = "booker.cdp", %key, count = snapshots.len(), "query");
		Ok(snapshots.into_iter().map(|snapshot| ElementHandle::from_snapshot(key, snapshot)).collect())
	}

	async fn click(&self, element: &ElementHandle) -> Result<()> {
		let scope = self.scope(element.key).await?.ok_or_else(|| not_found(element))?;
		self.with_element(&scope, element, "el.scrollIntoView({ block: 'center' }); el.click();").await
	}

	async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<()> {
		let scope = self.scope(element.key).await?.ok_or_else(|| not_found(element))?;
		self.with_element(&scope, element, "el.focus();").await?;
		Ok(self.page.insert_text_in(&scope, text).await?)
	}

	async fn capture_screenshot(&self) -> Result<Option<Vec<u8>>> {
		Ok(Some(self.page.capture_screenshot().await?))
	}
}

fn not_found(element: &ElementHandle) -> Error {
	Error::ElementNotFound(format!("{} #{}", element.key, element.id))
}

fn element_script(id: u64, body: &str) -> String {
	format!("(() => {{ const el = document.querySelector('[data-booker-handle=\"{id}\"]'); if (!el) return false; {body} return true; }})()")
}

fn query_script(css: &str) -> Result<String> {
	Ok(format!(
		r#"(() => {{
	const counter = document.documentElement;
	return Array.from(document.querySelectorAll({css})).map((el) => {{
		if (!el.dataset.bookerHandle) {{
			const next = Number(counter.dataset.bookerSeq || 0) + 1;
			counter.dataset.bookerSeq = String(next);
			el.dataset.bookerHandle = String(next);
		}}
		const attributes = {{}};
		for (const attr of el.attributes) attributes[attr.name] = attr.value;
		return {{
			handle: Number(el.dataset.bookerHandle),
			label: el.getAttribute('aria-label'),
			text: (el.innerText || el.textContent || '').trim(),
			attributes,
		}};
	}});
}})()"#,
		css = serde_json::to_string(css)?,
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_script_escapes_selector() {
		let script = query_script("[data-testid=\"purchase-button\"]").unwrap();
		assert!(script.contains(r#"querySelectorAll("[data-testid=\"purchase-button\"]")"#));
	}

	#[test]
	fn element_script_targets_handle_tag() {
		let script = element_script(42, "el.click();");
		assert!(script.contains(r#"[data-booker-handle="42"]"#));
		assert!(script.contains("el.click();"));
	}
}
