//! Error types for the booking engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// A bounded UI wait elapsed. Fatal to the run.
	#[error("Timed out after {ms}ms waiting for {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("Element not found: {0}")]
	ElementNotFound(String),

	#[error("Invalid booking URL: {0}")]
	Url(#[from] url::ParseError),

	#[error(transparent)]
	Runtime(#[from] booker_runtime::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns `true` for bounded-wait timeouts from either the engine or the CDP runtime.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Timeout { .. } => true,
			Error::Runtime(err) => err.is_timeout(),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn runtime_timeouts_count_as_timeouts() {
		let err = Error::from(booker_runtime::Error::Timeout {
			what: "Runtime.evaluate".into(),
			timeout: Duration::from_secs(30),
		});
		assert!(err.is_timeout());
		assert!(!Error::InvalidConfig("x".into()).is_timeout());
	}

	#[test]
	fn timeout_message_names_condition() {
		let err = Error::Timeout {
			ms: 10_000,
			condition: "confirmation-id".into(),
		};
		assert_eq!(err.to_string(), "Timed out after 10000ms waiting for confirmation-id");
	}
}
