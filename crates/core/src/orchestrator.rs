//! The attempt loop: authenticate once, then scan, match and submit until a
//! booking is made or the retry budget runs out.
//!
//! # State Machine
//!
//! ```text
//! Start -> Authenticating -> Scanning -> Matching -> Submitting -> Success
//!                              ^   |         |
//!                              |   v         v
//!                              +- Retrying <-+
//!                                   |
//!                                   v
//!                               Exhausted
//! ```
//!
//! Retrying sleeps for the configured delay and re-navigates to the booking
//! page; it never re-enters `Authenticating`. UI-wait timeouts are not part of
//! the machine: they abort the run with an error.

use std::fmt;

use tracing::{debug, info, warn};

use crate::criteria::{PatronCredentials, ReservationCriteria, StepTimeouts};
use crate::driver::{PageDriver, query_within};
use crate::error::Result;
use crate::matcher::{BookingMatch, SlotMatcher};
use crate::navigation::BookingUrls;
use crate::scanner::{AvailabilityScanner, DayCandidate};
use crate::selectors::SelectorKey;
use crate::session::{SessionManager, SessionState};
use crate::submitter::{BookingSubmitter, Confirmation, DRY_RUN_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Start,
	Authenticating,
	Scanning,
	Matching,
	Submitting,
	Retrying,
	Success,
	Exhausted,
}

/// Why an attempt came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
	/// The calendar had no acceptable open day.
	NoAvailability,
	/// Open days existed but none offered an acceptable time.
	NoMatchingSlot,
}

impl Shortfall {
	/// Final message when the last attempt ended this way.
	pub fn exhausted_message(self) -> &'static str {
		match self {
			Shortfall::NoAvailability => "no availability after retries",
			Shortfall::NoMatchingSlot => "no matching slots after retries",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
	Booked {
		day: String,
		time: String,
		confirmation_id: String,
	},
	DryRun {
		day: String,
		time: String,
	},
	Exhausted {
		shortfall: Shortfall,
	},
}

impl BookingOutcome {
	/// `true` when a slot was secured, or would have been outside dry-run mode.
	pub fn is_success(&self) -> bool {
		!matches!(self, BookingOutcome::Exhausted { .. })
	}

	pub fn message(&self) -> String {
		match self {
			BookingOutcome::Booked { confirmation_id, .. } => format!("booked! {confirmation_id}"),
			BookingOutcome::DryRun { .. } => DRY_RUN_MESSAGE.to_string(),
			BookingOutcome::Exhausted { shortfall } => shortfall.exhausted_message().to_string(),
		}
	}
}

impl fmt::Display for BookingOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message())
	}
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
	pub outcome: BookingOutcome,
	/// Attempts made, including the first.
	pub attempts: u64,
	/// Retry delays slept.
	pub delays: u64,
	/// Every phase entered, in order.
	pub phases: Vec<Phase>,
}

enum Step {
	Start,
	Authenticating,
	Scanning,
	Matching(Vec<DayCandidate>),
	Submitting(BookingMatch),
	Retrying(Shortfall),
	Success(BookingOutcome),
	Exhausted(Shortfall),
}

impl Step {
	fn phase(&self) -> Phase {
		match self {
			Step::Start => Phase::Start,
			Step::Authenticating => Phase::Authenticating,
			Step::Scanning => Phase::Scanning,
			Step::Matching(_) => Phase::Matching,
			Step::Submitting(_) => Phase::Submitting,
			Step::Retrying(_) => Phase::Retrying,
			Step::Success(_) => Phase::Success,
			Step::Exhausted(_) => Phase::Exhausted,
		}
	}
}

pub struct AttemptOrchestrator<'a, D: PageDriver + ?Sized> {
	driver: &'a D,
	criteria: &'a ReservationCriteria,
	credentials: &'a PatronCredentials,
	urls: BookingUrls,
	timeouts: StepTimeouts,
}

impl<'a, D: PageDriver + ?Sized> AttemptOrchestrator<'a, D> {
	pub fn new(driver: &'a D, criteria: &'a ReservationCriteria, credentials: &'a PatronCredentials) -> Result<Self> {
		Ok(Self {
			driver,
			criteria,
			credentials,
			urls: BookingUrls::new(criteria)?,
			timeouts: StepTimeouts::default(),
		})
	}

	pub fn with_timeouts(mut self, timeouts: StepTimeouts) -> Self {
		self.timeouts = timeouts;
		self
	}

	pub fn urls(&self) -> &BookingUrls {
		&self.urls
	}

	/// Runs attempts until success or exhaustion.
	///
	/// At most `max_retry_attempts + 1` attempts are made. `session` is read to
	/// decide whether to sign in and is marked once sign-in succeeds.
	///
	/// # Errors
	///
	/// Any fatal step error: a UI wait that timed out during sign-in or
	/// checkout, or a driver failure.
	pub async fn run(&self, session: &mut SessionState) -> Result<RunReport> {
		let session_manager = SessionManager::new(self.credentials, self.timeouts.login);
		let scanner = AvailabilityScanner::new(self.criteria, self.timeouts.calendar);
		let matcher = SlotMatcher::new(self.criteria, self.timeouts.slots);
		let submitter = BookingSubmitter::new(self.credentials, self.timeouts, self.criteria.dry_run());

		let max_attempts = self.criteria.max_total_attempts();
		let mut attempt: u64 = 1;
		let mut delays: u64 = 0;
		let mut phases = Vec::new();
		let mut step = Step::Start;

		loop {
			phases.push(step.phase());
			debug!(target = "booker", attempt, phase = ?step.phase(), "enter phase");

			step = match step {
				Step::Start => {
					info!(target = "booker", attempt, max_attempts, "starting attempt");
					self.visit(session.is_authenticated()).await?;
					Step::Authenticating
				}
				Step::Authenticating => {
					session_manager.ensure_authenticated(self.driver, session).await?;
					Step::Scanning
				}
				Step::Scanning => {
					let days = scanner.scan(self.driver).await?;
					if days.is_empty() {
						Step::Retrying(Shortfall::NoAvailability)
					} else {
						Step::Matching(days)
					}
				}
				Step::Matching(days) => match matcher.find_slot(self.driver, &days).await? {
					Some(found) => Step::Submitting(found),
					None => Step::Retrying(Shortfall::NoMatchingSlot),
				},
				Step::Submitting(found) => {
					let outcome = match submitter.submit(self.driver, &found.slot).await? {
						Confirmation::Booked { confirmation_id } => BookingOutcome::Booked {
							day: found.day,
							time: found.time,
							confirmation_id,
						},
						Confirmation::DryRun => BookingOutcome::DryRun {
							day: found.day,
							time: found.time,
						},
					};
					Step::Success(outcome)
				}
				Step::Retrying(shortfall) => {
					if attempt < max_attempts {
						info!(
							target = "booker",
							attempt,
							?shortfall,
							delay_ms = self.criteria.retry_delay().as_millis() as u64,
							"nothing bookable, retrying"
						);
						tokio::time::sleep(self.criteria.retry_delay()).await;
						delays += 1;
						attempt += 1;
						self.visit(session.is_authenticated()).await?;
						Step::Scanning
					} else {
						Step::Exhausted(shortfall)
					}
				}
				Step::Success(outcome) => {
					info!(target = "booker", attempt, outcome = %outcome, "run finished");
					return Ok(RunReport {
						outcome,
						attempts: attempt,
						delays,
						phases,
					});
				}
				Step::Exhausted(shortfall) => {
					warn!(target = "booker", attempts = attempt, "{}", shortfall.exhausted_message());
					return Ok(RunReport {
						outcome: BookingOutcome::Exhausted { shortfall },
						attempts: attempt,
						delays,
						phases,
					});
				}
			};
		}
	}

	/// Navigates to where the next attempt starts and clears the consent modal.
	async fn visit(&self, authenticated: bool) -> Result<()> {
		self.driver.navigate(self.urls.visit_url(authenticated)).await?;

		if self.criteria.dismiss_consent() {
			let buttons = query_within(self.driver, SelectorKey::ConsentButton, self.timeouts.consent).await?;
			if let Some(button) = buttons.first() {
				self.driver.click(button).await?;
				debug!(target = "booker", "consent modal dismissed");
			}
		}
		Ok(())
	}
}
