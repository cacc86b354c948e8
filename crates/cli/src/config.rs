//! Config file loading with environment and flag overrides.

use std::path::Path;

use booker::{BookingUrls, PatronConfig, PatronCredentials, ReservationConfig, ReservationCriteria, Selectors};
use serde::Serialize;
use tracing::debug;

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};
use crate::output::TextOutput;

/// Validated inputs for a run.
#[derive(Debug)]
pub struct ResolvedConfig {
	pub criteria: ReservationCriteria,
	pub credentials: PatronCredentials,
	pub selectors: Selectors,
}

/// Reads `path` as a [`ReservationConfig`].
pub fn load_file(path: &Path) -> Result<ReservationConfig> {
	let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;
	ReservationConfig::from_json(&text).map_err(|source| CliError::ConfigParse {
		path: path.to_path_buf(),
		source,
	})
}

/// Applies environment and command-line overrides on top of the file.
pub fn apply_overrides(mut config: ReservationConfig, args: &ConfigArgs) -> ReservationConfig {
	let patron = config.patron.get_or_insert_with(PatronConfig::default);
	if let Some(email) = &args.email {
		patron.email = Some(email.clone());
	}
	if let Some(password) = &args.password {
		patron.password = Some(password.clone());
	}
	if let Some(cvv) = &args.cvv {
		patron.cvv = Some(cvv.clone());
	}

	if args.dry_run {
		config.dry_run = true;
	}
	if args.retry_attempts.is_some() {
		config.retry_attempts = args.retry_attempts;
	}
	if args.retry_delay.is_some() {
		config.retry_delay = args.retry_delay;
	}
	config
}

/// Loads, overlays, and validates configuration.
pub fn resolve(args: &ConfigArgs) -> Result<ResolvedConfig> {
	let config = apply_overrides(load_file(&args.config)?, args);
	let invalid = |source| CliError::ConfigParse {
		path: args.config.clone(),
		source,
	};

	let criteria = config.to_criteria().map_err(invalid)?;
	let credentials = config.to_credentials().map_err(invalid)?;
	let selectors = config.to_selectors().map_err(invalid)?;
	debug!(target = "booker", path = %args.config.display(), overrides = config.selectors.len(), "configuration resolved");
	Ok(ResolvedConfig {
		criteria,
		credentials,
		selectors,
	})
}

/// Redacted view of the resolved configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
	pub booking_url: String,
	pub login_url: String,
	pub party_size: u32,
	pub desired_time_slots: Vec<String>,
	pub excluded_days: Vec<String>,
	pub desired_days: Vec<String>,
	pub dry_run: bool,
	pub retry_attempts: u32,
	pub retry_delay_ms: u64,
	pub dismiss_consent: bool,
	pub patron: &'static str,
}

impl ConfigSummary {
	pub fn new(resolved: &ResolvedConfig) -> Result<Self> {
		let criteria = &resolved.criteria;
		let urls = BookingUrls::new(criteria)?;
		Ok(Self {
			booking_url: urls.booking_url().to_string(),
			login_url: urls.login_url().to_string(),
			party_size: criteria.party_size(),
			desired_time_slots: criteria.desired_time_slots().iter().cloned().collect(),
			excluded_days: criteria.excluded_days().iter().cloned().collect(),
			desired_days: criteria.desired_days().to_vec(),
			dry_run: criteria.dry_run(),
			retry_attempts: criteria.max_retry_attempts(),
			retry_delay_ms: criteria.retry_delay().as_millis() as u64,
			dismiss_consent: criteria.dismiss_consent(),
			patron: "<redacted>",
		})
	}
}

impl TextOutput for ConfigSummary {
	fn render_text(&self) -> String {
		let list = |items: &[String]| if items.is_empty() { "any".to_string() } else { items.join(", ") };
		[
			format!("booking page:   {}", self.booking_url),
			format!("party size:     {}", self.party_size),
			format!("time slots:     {}", list(&self.desired_time_slots)),
			format!("desired days:   {}", list(&self.desired_days)),
			format!("excluded days:  {}", if self.excluded_days.is_empty() { "none".to_string() } else { self.excluded_days.join(", ") }),
			format!("retries:        {} every {}ms", self.retry_attempts, self.retry_delay_ms),
			format!("dry run:        {}", self.dry_run),
		]
		.join("\n")
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use super::*;

	fn args(path: PathBuf) -> ConfigArgs {
		ConfigArgs {
			config: path,
			email: None,
			password: None,
			cvv: None,
			dry_run: false,
			retry_attempts: None,
			retry_delay: None,
		}
	}

	fn write_config(dir: &tempfile::TempDir, json: &str) -> PathBuf {
		let path = dir.path().join("booker.json");
		std::fs::write(&path, json).expect("config should be written");
		path
	}

	#[test]
	fn flags_and_env_override_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = write_config(
			&dir,
			r#"{"bookingPage": "/acme", "partySize": 2, "retryAttempts": 9, "patron": {"email": "file@example.com", "password": "pw", "cvv": "12"}}"#,
		);
		let mut args = args(path);
		args.cvv = Some("321".into());
		args.dry_run = true;
		args.retry_attempts = Some(1);

		let resolved = resolve(&args).unwrap();
		assert!(resolved.criteria.dry_run());
		assert_eq!(resolved.criteria.max_retry_attempts(), 1);
	}

	#[test]
	fn patron_can_come_entirely_from_overrides() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = write_config(&dir, r#"{"bookingPage": "/acme", "partySize": 2}"#);
		let mut args = args(path);
		args.email = Some("env@example.com".into());
		args.password = Some("pw".into());
		args.cvv = Some("123".into());

		assert!(resolve(&args).is_ok());
	}

	#[test]
	fn invalid_cvv_names_the_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = write_config(
			&dir,
			r#"{"bookingPage": "/acme", "partySize": 2, "patron": {"email": "a@b.c", "password": "pw", "cvv": "12"}}"#,
		);
		let err = resolve(&args(path)).unwrap_err();
		assert!(matches!(err, CliError::ConfigParse { .. }));
		assert!(err.to_string().contains("booker.json"));
	}

	#[test]
	fn selector_overrides_are_resolved() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = write_config(
			&dir,
			r#"{"bookingPage": "/acme", "partySize": 2, "selectors": {"time-slot": ".slot"}, "patron": {"email": "a@b.c", "password": "pw", "cvv": "123"}}"#,
		);
		let resolved = resolve(&args(path)).unwrap();
		assert_eq!(resolved.selectors.get(booker::SelectorKey::TimeSlot).css, ".slot");

		let path = write_config(
			&dir,
			r#"{"bookingPage": "/acme", "partySize": 2, "selectors": {"slot": ".slot"}, "patron": {"email": "a@b.c", "password": "pw", "cvv": "123"}}"#,
		);
		assert!(matches!(resolve(&args(path)).unwrap_err(), CliError::ConfigParse { .. }));
	}

	#[test]
	fn missing_file_is_a_read_error() {
		let err = load_file(Path::new("/definitely/missing/booker.json")).unwrap_err();
		assert!(matches!(err, CliError::ConfigRead { .. }));
	}

	#[test]
	fn summary_redacts_patron() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = write_config(
			&dir,
			r#"{"bookingPage": "/acme", "partySize": 2, "patron": {"email": "secret@example.com", "password": "pw", "cvv": "123"}}"#,
		);
		let summary = ConfigSummary::new(&resolve(&args(path)).unwrap()).unwrap();
		let json = serde_json::to_string(&summary).unwrap();
		assert!(!json.contains("secret@example.com"));
		assert_eq!(summary.booking_url, "https://www.exploretock.com/acme?size=2");
	}
}
