//! Raw reservation configuration as read from JSON.
//!
//! Every field is optional on the wire so partial files can be layered with
//! environment variables and flags before validation turns them into
//! [`ReservationCriteria`] and [`PatronCredentials`].

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::criteria::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS, PatronCredentials, ReservationCriteria};
use crate::error::{Error, Result};
use crate::selectors::{Locator, SelectorKey, Selectors};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub booking_page: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub party_size: Option<u32>,
	#[serde(default)]
	pub desired_time_slots: Vec<String>,
	#[serde(default)]
	pub excluded_days: Vec<String>,
	#[serde(default)]
	pub desired_days: Vec<String>,
	#[serde(default)]
	pub dry_run: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub retry_attempts: Option<u32>,
	/// Delay between attempts in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub retry_delay: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub site_origin: Option<String>,
	#[serde(default)]
	pub dismiss_consent: bool,
	/// CSS overrides keyed by selector name (`time-slot`, `calendar-day`, ...).
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub selectors: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub patron: Option<PatronConfig>,
}

/// Patron secrets as configured. Never serialized back out.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronConfig {
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default)]
	pub cvv: Option<String>,
}

impl std::fmt::Debug for PatronConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PatronConfig")
			.field("email", &self.email.as_ref().map(|_| "<redacted>"))
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("cvv", &self.cvv.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

impl Serialize for PatronConfig {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_none()
	}
}

impl ReservationConfig {
	/// Parses a JSON document.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Validates the reservation fields.
	pub fn to_criteria(&self) -> Result<ReservationCriteria> {
		let booking_page = self
			.booking_page
			.as_deref()
			.ok_or_else(|| Error::InvalidConfig("bookingPage is required".into()))?;
		let party_size = self.party_size.ok_or_else(|| Error::InvalidConfig("partySize is required".into()))?;

		let mut criteria = ReservationCriteria::new(booking_page, party_size)?
			.with_desired_time_slots(self.desired_time_slots.iter().map(|s| s.trim().to_string()))
			.with_excluded_days(self.excluded_days.iter().cloned())
			.with_desired_days(self.desired_days.iter().cloned())
			.with_dry_run(self.dry_run)
			.with_max_retry_attempts(self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS))
			.with_retry_delay(Duration::from_millis(self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY_MS)))
			.with_dismiss_consent(self.dismiss_consent);

		if let Some(origin) = &self.site_origin {
			criteria = criteria.with_site_origin(origin)?;
		}
		Ok(criteria)
	}

	/// Default locators with the configured overrides applied. An override
	/// keeps the default's frame.
	pub fn to_selectors(&self) -> Result<Selectors> {
		let mut selectors = Selectors::default();
		for (name, css) in &self.selectors {
			let key = SelectorKey::from_name(name).ok_or_else(|| Error::InvalidConfig(format!("unknown selector '{name}'")))?;
			let css = css.trim();
			if css.is_empty() {
				return Err(Error::InvalidConfig(format!("selector '{name}' is empty")));
			}
			let locator = match &selectors.get(key).frame {
				Some(frame) => Locator::in_frame(frame, css),
				None => Locator::css(css),
			};
			selectors = selectors.with(key, locator);
		}
		Ok(selectors)
	}

	/// Validates the patron block.
	pub fn to_credentials(&self) -> Result<PatronCredentials> {
		let patron = self
			.patron
			.as_ref()
			.ok_or_else(|| Error::InvalidConfig("patron email, password and cvv are required".into()))?;
		let field = |value: &Option<String>, name: &str| {
			value
				.clone()
				.ok_or_else(|| Error::InvalidConfig(format!("patron {name} is required")))
		};
		PatronCredentials::new(field(&patron.email, "email")?, field(&patron.password, "password")?, field(&patron.cvv, "cvv")?)
	}
}
