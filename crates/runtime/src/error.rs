//! Error types for the CDP runtime.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("WebSocket error: {0}")]
	WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

	#[error("Protocol error {code}: {message}")]
	Protocol { code: i64, message: String },

	#[error("Timed out after {timeout:?} waiting for {what}")]
	Timeout { what: String, timeout: Duration },

	#[error("Connection closed before a response arrived")]
	ChannelClosed,

	#[error("Navigation to {url} failed: {reason}")]
	Navigation { url: String, reason: String },

	#[error("Script evaluation failed: {0}")]
	Script(String),

	#[error("Browser launch failed: {0}")]
	Launch(String),

	#[error("Debugger endpoint discovery failed: {0}")]
	Discovery(String),

	#[error("Invalid screenshot payload: {0}")]
	Screenshot(#[from] base64::DecodeError),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns `true` when this error was caused by a bounded wait elapsing.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::WebSocket(Box::new(err))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timeout_is_classified() {
		let err = Error::Timeout {
			what: "Page.navigate".into(),
			timeout: Duration::from_secs(1),
		};
		assert!(err.is_timeout());
		assert!(!Error::ChannelClosed.is_timeout());
		assert_eq!(err.to_string(), "Timed out after 1s waiting for Page.navigate");
	}
}
