//! Calendar scan: which days are open and acceptable.

use std::time::Duration;

use tracing::{debug, warn};

use crate::criteria::ReservationCriteria;
use crate::driver::{ElementHandle, PageDriver};
use crate::error::Result;
use crate::selectors::SelectorKey;

/// An open calendar day that passed the day filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCandidate {
	pub label: String,
	pub element: ElementHandle,
}

pub struct AvailabilityScanner<'a> {
	criteria: &'a ReservationCriteria,
	timeout: Duration,
}

impl<'a> AvailabilityScanner<'a> {
	/// `timeout` bounds the wait for the calendar widget.
	pub fn new(criteria: &'a ReservationCriteria, timeout: Duration) -> Self {
		Self { criteria, timeout }
	}

	/// Reads the calendar and returns acceptable open days in calendar order.
	///
	/// An empty result is normal. A calendar that never renders is treated as
	/// empty.
	pub async fn scan<D: PageDriver + ?Sized>(&self, driver: &D) -> Result<Vec<DayCandidate>> {
		let days = match driver.wait_for(SelectorKey::CalendarDay, self.timeout).await {
			Ok(days) => days,
			Err(err) if err.is_timeout() => {
				warn!(target = "booker", timeout_ms = self.timeout.as_millis() as u64, "calendar did not render");
				return Ok(Vec::new());
			}
			Err(err) => return Err(err),
		};

		let total = days.len();
		let candidates = self.filter(days);
		debug!(target = "booker", total, candidates = candidates.len(), "calendar scanned");
		Ok(candidates)
	}

	/// Applies availability, exclusion and inclusion filters, keeping order.
	pub fn filter(&self, days: Vec<ElementHandle>) -> Vec<DayCandidate> {
		let desired = self.criteria.desired_days();
		days.into_iter()
			.filter(|day| day.attribute("aria-disabled") == Some("false") && day.has_class("is-available"))
			.map(|element| DayCandidate {
				label: element.label.clone().unwrap_or_default(),
				element,
			})
			.filter(|day| !self.criteria.excluded_days().contains(&day.label))
			.filter(|day| desired.is_empty() || desired.contains(&day.label))
			.collect()
	}
}
