//! Reservation preferences and patron credentials for one run.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use url::Url;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Site the booking page lives on when it is given as a path.
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.exploretock.com";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 10_000;

static CVV_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("cvv pattern should compile"));

/// What to book and how hard to try. Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationCriteria {
	booking_page: String,
	site_origin: Url,
	party_size: NonZeroU32,
	desired_time_slots: BTreeSet<String>,
	excluded_days: BTreeSet<String>,
	desired_days: Vec<String>,
	dry_run: bool,
	max_retry_attempts: u32,
	retry_delay: Duration,
	dismiss_consent: bool,
}

impl ReservationCriteria {
	/// Creates criteria with default retry policy and no day/time preferences.
	///
	/// `booking_page` may be a path on [`DEFAULT_SITE_ORIGIN`] or an absolute URL.
	pub fn new(booking_page: impl Into<String>, party_size: u32) -> Result<Self> {
		let booking_page = booking_page.into().trim().to_string();
		if booking_page.is_empty() {
			return Err(Error::InvalidConfig("bookingPage must not be empty".into()));
		}
		let party_size = NonZeroU32::new(party_size).ok_or_else(|| Error::InvalidConfig("partySize must be greater than zero".into()))?;

		Ok(Self {
			booking_page,
			site_origin: Url::parse(DEFAULT_SITE_ORIGIN)?,
			party_size,
			desired_time_slots: BTreeSet::new(),
			excluded_days: BTreeSet::new(),
			desired_days: Vec::new(),
			dry_run: false,
			max_retry_attempts: DEFAULT_RETRY_ATTEMPTS,
			retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
			dismiss_consent: false,
		})
	}

	/// Sets the site origin used to resolve a path-only booking page.
	pub fn with_site_origin(mut self, origin: &str) -> Result<Self> {
		self.site_origin = Url::parse(origin)?;
		if self.site_origin.cannot_be_a_base() {
			return Err(Error::InvalidConfig(format!("siteOrigin '{origin}' is not a base URL")));
		}
		Ok(self)
	}

	/// Sets acceptable time-slot labels; empty accepts any slot.
	pub fn with_desired_time_slots<I, S>(mut self, slots: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.desired_time_slots = slots.into_iter().map(Into::into).collect();
		self
	}

	/// Sets day labels that are never booked.
	pub fn with_excluded_days<I, S>(mut self, days: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.excluded_days = days.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the only day labels that may be booked; empty accepts any day.
	///
	/// Order is kept: the first entry is sent to the site as a date hint.
	pub fn with_desired_days<I, S>(mut self, days: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut seen = BTreeSet::new();
		self.desired_days = days.into_iter().map(Into::into).filter(|day: &String| seen.insert(day.clone())).collect();
		self
	}

	pub fn with_dry_run(mut self, dry_run: bool) -> Self {
		self.dry_run = dry_run;
		self
	}

	/// Sets how many retries follow the first attempt.
	pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
		self.max_retry_attempts = attempts;
		self
	}

	pub fn with_retry_delay(mut self, delay: Duration) -> Self {
		self.retry_delay = delay;
		self
	}

	/// Dismisses the cookie-consent modal after each navigation.
	pub fn with_dismiss_consent(mut self, dismiss: bool) -> Self {
		self.dismiss_consent = dismiss;
		self
	}

	pub fn booking_page(&self) -> &str {
		&self.booking_page
	}

	pub fn site_origin(&self) -> &Url {
		&self.site_origin
	}

	pub fn party_size(&self) -> u32 {
		self.party_size.get()
	}

	pub fn desired_time_slots(&self) -> &BTreeSet<String> {
		&self.desired_time_slots
	}

	pub fn excluded_days(&self) -> &BTreeSet<String> {
		&self.excluded_days
	}

	pub fn desired_days(&self) -> &[String] {
		&self.desired_days
	}

	pub fn dry_run(&self) -> bool {
		self.dry_run
	}

	pub fn max_retry_attempts(&self) -> u32 {
		self.max_retry_attempts
	}

	/// Upper bound on attempts in one run: the first plus every retry.
	pub fn max_total_attempts(&self) -> u64 {
		u64::from(self.max_retry_attempts) + 1
	}

	pub fn retry_delay(&self) -> Duration {
		self.retry_delay
	}

	pub fn dismiss_consent(&self) -> bool {
		self.dismiss_consent
	}
}

/// Patron login and card-verification secrets.
///
/// Values are zeroized on drop and never appear in `Debug` output.
#[derive(Clone)]
pub struct PatronCredentials {
	email: Zeroizing<String>,
	password: Zeroizing<String>,
	cvv: Zeroizing<String>,
}

impl PatronCredentials {
	/// Validates and wraps patron secrets.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidConfig`] if email or password is blank, or if
	/// the CVV is not 3-4 ASCII digits.
	pub fn new(email: impl Into<String>, password: impl Into<String>, cvv: impl Into<String>) -> Result<Self> {
		let email = Zeroizing::new(email.into());
		let password = Zeroizing::new(password.into());
		let cvv = Zeroizing::new(cvv.into());

		if email.trim().is_empty() {
			return Err(Error::InvalidConfig("patron email must not be empty".into()));
		}
		if password.is_empty() {
			return Err(Error::InvalidConfig("patron password must not be empty".into()));
		}
		if !CVV_PATTERN.is_match(&cvv) {
			return Err(Error::InvalidConfig("patron cvv must be 3 or 4 digits".into()));
		}

		Ok(Self { email, password, cvv })
	}

	pub(crate) fn email(&self) -> &str {
		self.email.trim()
	}

	pub(crate) fn password(&self) -> &str {
		&self.password
	}

	pub(crate) fn cvv(&self) -> &str {
		&self.cvv
	}
}

impl fmt::Debug for PatronCredentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PatronCredentials")
			.field("email", &"<redacted>")
			.field("password", &"<redacted>")
			.field("cvv", &"<redacted>")
			.finish()
	}
}

/// Bounded waits for each UI step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
	/// Login form fields and the post-login marker.
	pub login: Duration,
	/// Calendar widget rendering.
	pub calendar: Duration,
	/// Time slots rendering after a day is selected.
	pub slots: Duration,
	/// Checkout form and purchase control.
	pub checkout: Duration,
	/// Third-party payment widget becoming ready.
	pub payment: Duration,
	/// Purchase confirmation id.
	pub confirmation: Duration,
	/// Cookie-consent modal.
	pub consent: Duration,
}

impl Default for StepTimeouts {
	fn default() -> Self {
		Self {
			login: Duration::from_secs(10),
			calendar: Duration::from_secs(5),
			slots: Duration::from_secs(2),
			checkout: Duration::from_secs(10),
			payment: Duration::from_secs(15),
			confirmation: Duration::from_secs(10),
			consent: Duration::from_secs(4),
		}
	}
}
