use std::path::PathBuf;

use thiserror::Error;

use crate::output::ErrorCode;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("Failed to read config {path}: {source}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid config {path}: {source}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: booker::Error,
	},

	#[error(transparent)]
	Booking(#[from] booker::Error),

	#[error(transparent)]
	Browser(#[from] booker_runtime::Error),

	#[error("Webhook delivery failed: {0}")]
	Webhook(#[from] reqwest::Error),
}

impl CliError {
	/// Output error code for this failure.
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::ConfigRead { .. } | CliError::ConfigParse { .. } => ErrorCode::InvalidConfig,
			CliError::Booking(err) => booking_code(err),
			CliError::Browser(err) => runtime_code(err),
			CliError::Webhook(_) => ErrorCode::InternalError,
		}
	}
}

fn booking_code(err: &booker::Error) -> ErrorCode {
	match err {
		booker::Error::InvalidConfig(_) | booker::Error::Url(_) => ErrorCode::InvalidConfig,
		booker::Error::Timeout { .. } => ErrorCode::Timeout,
		booker::Error::ElementNotFound(_) => ErrorCode::ElementNotFound,
		booker::Error::Runtime(err) => runtime_code(err),
		booker::Error::Json(_) => ErrorCode::InternalError,
	}
}

fn runtime_code(err: &booker_runtime::Error) -> ErrorCode {
	use booker_runtime::Error;
	match err {
		Error::Launch(_) | Error::Discovery(_) => ErrorCode::BrowserLaunchFailed,
		Error::Navigation { .. } => ErrorCode::NavigationFailed,
		Error::Script(_) => ErrorCode::JsEvalFailed,
		Error::Timeout { .. } => ErrorCode::Timeout,
		Error::Io(_) => ErrorCode::IoError,
		_ => ErrorCode::InternalError,
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn engine_timeouts_map_to_timeout_code() {
		let err = CliError::from(booker::Error::Timeout {
			ms: 10_000,
			condition: "confirmation-id".into(),
		});
		assert_eq!(err.code(), ErrorCode::Timeout);

		let nested = CliError::from(booker::Error::from(booker_runtime::Error::Timeout {
			what: "Page.navigate".into(),
			timeout: Duration::from_secs(30),
		}));
		assert_eq!(nested.code(), ErrorCode::Timeout);
	}

	#[test]
	fn config_errors_map_to_invalid_config() {
		let err = CliError::from(booker::Error::InvalidConfig("partySize".into()));
		assert_eq!(err.code(), ErrorCode::InvalidConfig);
	}

	#[test]
	fn launch_failures_are_classified() {
		let err = CliError::from(booker_runtime::Error::Launch("no chrome".into()));
		assert_eq!(err.code(), ErrorCode::BrowserLaunchFailed);
	}
}
