//! Final run report and chat-webhook delivery.

use std::time::Duration;

use booker::BookingOutcome;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::Result;
use crate::output::TextOutput;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportColor {
	Good,
	Danger,
}

/// One human-readable line describing how the run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
	pub color: ReportColor,
	pub text: String,
}

impl Report {
	pub fn from_outcome(outcome: &BookingOutcome) -> Self {
		match outcome {
			BookingOutcome::Booked { .. } => Self {
				color: ReportColor::Good,
				text: format!("<!channel> {outcome}"),
			},
			BookingOutcome::DryRun { .. } => Self {
				color: ReportColor::Good,
				text: outcome.to_string(),
			},
			BookingOutcome::Exhausted { .. } => Self {
				color: ReportColor::Danger,
				text: outcome.to_string(),
			},
		}
	}

	/// Report for a run aborted by an error.
	pub fn failure(message: impl std::fmt::Display) -> Self {
		Self {
			color: ReportColor::Danger,
			text: format!("booking failed: {message}"),
		}
	}

	/// Chat-webhook payload carrying this report as one attachment.
	pub fn webhook_payload(&self) -> serde_json::Value {
		json!({ "attachments": [{ "color": self.color, "text": self.text }] })
	}
}

impl TextOutput for Report {
	fn render_text(&self) -> String {
		match self.color {
			ReportColor::Good => self.text.green().to_string(),
			ReportColor::Danger => self.text.red().to_string(),
		}
	}
}

/// Posts `report` to `url`.
pub async fn post_webhook(url: &str, report: &Report) -> Result<()> {
	let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
	client
		.post(url)
		.json(&report.webhook_payload())
		.send()
		.await?
		.error_for_status()?;
	info!(target = "booker", "report delivered to webhook");
	Ok(())
}

/// Delivers `report` when a webhook is configured. Delivery failures are logged only.
pub async fn notify(url: Option<&str>, report: &Report) {
	let Some(url) = url else {
		return;
	};
	if let Err(err) = post_webhook(url, report).await {
		warn!(target = "booker", error = %err, "webhook delivery failed");
	}
}
