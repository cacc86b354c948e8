//! First-fit search for an acceptable time slot across candidate days.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::criteria::ReservationCriteria;
use crate::driver::{ElementHandle, PageDriver};
use crate::error::Result;
use crate::scanner::DayCandidate;
use crate::selectors::SelectorKey;

/// A rendered time slot for the currently selected day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCandidate {
	pub text: String,
	pub element: ElementHandle,
}

/// The day and time chosen for booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingMatch {
	pub day: String,
	pub time: String,
	pub slot: SlotCandidate,
}

const SLOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct SlotMatcher<'a> {
	criteria: &'a ReservationCriteria,
	timeout: Duration,
}

impl<'a> SlotMatcher<'a> {
	/// `timeout` bounds the wait for a selected day's slots to render.
	pub fn new(criteria: &'a ReservationCriteria, timeout: Duration) -> Self {
		Self { criteria, timeout }
	}

	/// Selects each day in order and returns the first acceptable slot.
	///
	/// Days are never revisited; a day whose slots do not render in time
	/// counts as having none.
	pub async fn find_slot<D: PageDriver + ?Sized>(&self, driver: &D, days: &[DayCandidate]) -> Result<Option<BookingMatch>> {
		let mut previous: Vec<String> = Vec::new();
		for day in days {
			driver.click(&day.element).await?;

			let slots = self.read_slots(driver, &previous).await?;
			trace!(target = "booker", day = %day.label, slots = slots.len(), "day selected");
			previous = slots.iter().map(|slot| slot.text.clone()).collect();

			if let Some(slot) = self.pick(slots) {
				debug!(target = "booker", day = %day.label, time = %slot.text, "slot matched");
				return Ok(Some(BookingMatch {
					day: day.label.clone(),
					time: slot.text.clone(),
					slot,
				}));
			}
		}
		Ok(None)
	}

	/// Polls the slot list until it renders and differs from `previous`, the
	/// list shown for the day selected before.
	///
	/// A list still equal to `previous` when the wait elapses yields nothing:
	/// those times were already rejected.
	async fn read_slots<D: PageDriver + ?Sized>(&self, driver: &D, previous: &[String]) -> Result<Vec<SlotCandidate>> {
		let deadline = Instant::now() + self.timeout;
		loop {
			let slots: Vec<SlotCandidate> = driver
				.query_elements(SelectorKey::TimeSlot)
				.await?
				.into_iter()
				.map(|element| SlotCandidate {
					text: element.text.trim().to_string(),
					element,
				})
				.collect();

			let stale = slots.iter().map(|slot| slot.text.as_str()).eq(previous.iter().map(String::as_str));
			if !slots.is_empty() && !stale {
				return Ok(slots);
			}
			if Instant::now() >= deadline {
				return Ok(Vec::new());
			}
			tokio::time::sleep(SLOT_POLL_INTERVAL).await;
		}
	}

	/// First slot when no times are preferred, else the first preferred one.
	pub fn pick(&self, slots: Vec<SlotCandidate>) -> Option<SlotCandidate> {
		let preferred = self.criteria.desired_time_slots();
		slots.into_iter().find(|slot| preferred.is_empty() || preferred.contains(&slot.text))
	}
}
