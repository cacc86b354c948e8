//! The page-driver seam between the engine and a browser.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use booker_protocol::ElementSnapshot;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::selectors::SelectorKey;

pub mod cdp;
pub mod scripted;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A queried element, addressable by the driver that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
	pub id: u64,
	pub key: SelectorKey,
	/// Accessible label (`aria-label`).
	pub label: Option<String>,
	pub text: String,
	pub attributes: BTreeMap<String, String>,
}

impl ElementHandle {
	pub fn from_snapshot(key: SelectorKey, snapshot: ElementSnapshot) -> Self {
		Self {
			id: snapshot.handle,
			key,
			label: snapshot.label,
			text: snapshot.text,
			attributes: snapshot.attributes,
		}
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}

	pub fn has_class(&self, class: &str) -> bool {
		self.attribute("class")
			.is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
	}
}

/// Browser capability the engine is written against.
///
/// Elements are addressed by [`SelectorKey`]; the driver owns the mapping to
/// concrete markup.
#[async_trait]
pub trait PageDriver: Send + Sync {
	async fn navigate(&self, url: &str) -> Result<()>;

	/// Returns every element currently matching `key`, in document order.
	async fn query_elements(&self, key: SelectorKey) -> Result<Vec<ElementHandle>>;

	async fn click(&self, element: &ElementHandle) -> Result<()>;

	async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<()>;

	/// Waits until at least one element matches `key`.
	///
	/// # Errors
	///
	/// Returns [`Error::Timeout`] once `timeout` elapses without a match.
	async fn wait_for(&self, key: SelectorKey, timeout: Duration) -> Result<Vec<ElementHandle>> {
		let start = Instant::now();
		loop {
			let found = self.query_elements(key).await?;
			if !found.is_empty() {
				return Ok(found);
			}
			if start.elapsed() >= timeout {
				return Err(Error::Timeout {
					ms: timeout.as_millis() as u64,
					condition: key.to_string(),
				});
			}
			tokio::time::sleep(WAIT_POLL_INTERVAL).await;
		}
	}

	/// PNG of the current viewport, if the driver can take one.
	async fn capture_screenshot(&self) -> Result<Option<Vec<u8>>> {
		Ok(None)
	}
}

/// Like [`PageDriver::wait_for`], but an elapsed wait yields no elements.
pub async fn query_within<D: PageDriver + ?Sized>(driver: &D, key: SelectorKey, timeout: Duration) -> Result<Vec<ElementHandle>> {
	match driver.wait_for(key, timeout).await {
		Ok(found) => Ok(found),
		Err(err) if err.is_timeout() => Ok(Vec::new()),
		Err(err) => Err(err),
	}
}

/// Waits for `key` and returns its first element.
pub async fn first_element<D: PageDriver + ?Sized>(driver: &D, key: SelectorKey, timeout: Duration) -> Result<ElementHandle> {
	driver
		.wait_for(key, timeout)
		.await?
		.into_iter()
		.next()
		.ok_or_else(|| Error::ElementNotFound(key.to_string()))
}
