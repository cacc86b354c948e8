use std::io::{self, Write};
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;

use crate::output::format::OutputFormat;
use crate::output::model::{Artifact, CommandError, CommandResult, ErrorCode};

/// Builder for constructing command results.
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
	artifacts: Vec<Artifact>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
			artifacts: Vec::new(),
		}
	}

	/// Builder whose duration counts from `start_time` instead of now.
	pub fn started_at(command: impl Into<String>, start_time: Instant) -> Self {
		Self {
			start_time,
			..Self::new(command)
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
		});
		self
	}

	pub fn artifact(mut self, artifact: Artifact) -> Self {
		self.artifacts.push(artifact);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			ok: self.error.is_none() && self.data.is_some(),
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(self.start_time.elapsed().as_millis() as u64),
			artifacts: self.artifacts,
		}
	}
}

/// Text rendering for command payloads.
pub trait TextOutput {
	fn render_text(&self) -> String;
}

impl TextOutput for () {
	fn render_text(&self) -> String {
		String::new()
	}
}

/// Print a command result to stdout in the specified format.
pub fn print_result<T: Serialize + TextOutput>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize + TextOutput>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if let Some(ref data) = result.data {
		let text = data.render_text();
		if !text.is_empty() {
			let _ = writeln!(stdout, "{text}");
		}
	}
	if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "{} {}", format!("Error [{}]:", error.code).red(), error.message);
	}

	for artifact in &result.artifacts {
		let _ = writeln!(stdout, "Saved {:?}: {}", artifact.artifact_type, artifact.path.display());
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ok_requires_data_and_no_error() {
		let ok: CommandResult<u32> = ResultBuilder::new("check").data(1).build();
		assert!(ok.ok);

		let failed: CommandResult<u32> = ResultBuilder::new("book").error(ErrorCode::Timeout, "late").build();
		assert!(!failed.ok);
		assert!(failed.duration_ms.is_some());
	}

	#[test]
	fn duration_counts_from_given_start() {
		let start = Instant::now() - std::time::Duration::from_millis(250);
		let result: CommandResult<u32> = ResultBuilder::started_at("book", start).data(1).build();
		assert!(result.duration_ms.unwrap() >= 250);
	}

	#[test]
	fn envelope_serializes_camel_case() {
		let result: CommandResult<()> = ResultBuilder::new("book").error(ErrorCode::InvalidConfig, "bad").build();
		let json = serde_json::to_value(&result).unwrap();
		assert_eq!(json["ok"], false);
		assert_eq!(json["error"]["code"], "INVALID_CONFIG");
		assert!(json.get("durationMs").is_some());
		assert!(json.get("artifacts").is_none());
	}
}
