//! Checkout: payment verification and the final purchase.

use std::fmt;

use tracing::{debug, info};

use crate::criteria::{PatronCredentials, StepTimeouts};
use crate::driver::{PageDriver, first_element};
use crate::error::Result;
use crate::matcher::SlotCandidate;
use crate::selectors::SelectorKey;

pub const DRY_RUN_MESSAGE: &str = "not booked, dry run mode enabled...";

/// How a checkout ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
	Booked { confirmation_id: String },
	/// Checkout was filled in but purchase was not clicked.
	DryRun,
}

impl fmt::Display for Confirmation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Confirmation::Booked { confirmation_id } => write!(f, "booked! {confirmation_id}"),
			Confirmation::DryRun => f.write_str(DRY_RUN_MESSAGE),
		}
	}
}

pub struct BookingSubmitter<'a> {
	credentials: &'a PatronCredentials,
	timeouts: StepTimeouts,
	dry_run: bool,
}

impl<'a> BookingSubmitter<'a> {
	pub fn new(credentials: &'a PatronCredentials, timeouts: StepTimeouts, dry_run: bool) -> Self {
		Self {
			credentials,
			timeouts,
			dry_run,
		}
	}

	/// Opens checkout for `slot` and completes it.
	///
	/// # Errors
	///
	/// Every wait here is fatal: a checkout form, payment widget, purchase
	/// button, or receipt that does not render in time yields
	/// [`Error::Timeout`](crate::Error::Timeout).
	pub async fn submit<D: PageDriver + ?Sized>(&self, driver: &D, slot: &SlotCandidate) -> Result<Confirmation> {
		driver.click(&slot.element).await?;
		self.complete_payment(driver).await?;

		if self.dry_run {
			info!(target = "booker", "dry run: stopping before purchase");
			return Ok(Confirmation::DryRun);
		}

		let purchase = first_element(driver, SelectorKey::PurchaseButton, self.timeouts.checkout).await?;
		driver.click(&purchase).await?;

		let receipt = first_element(driver, SelectorKey::ConfirmationId, self.timeouts.confirmation).await?;
		let confirmation_id = receipt.text.trim().to_string();
		info!(target = "booker", %confirmation_id, "purchase confirmed");
		Ok(Confirmation::Booked { confirmation_id })
	}

	async fn complete_payment<D: PageDriver + ?Sized>(&self, driver: &D) -> Result<()> {
		driver.wait_for(SelectorKey::CheckoutForm, self.timeouts.checkout).await?;

		if driver.query_elements(SelectorKey::CvvMarker).await?.is_empty() {
			debug!(target = "booker", "no card verification required");
			return Ok(());
		}

		let cvv = first_element(driver, SelectorKey::PaymentCvvInput, self.timeouts.payment).await?;
		driver.type_text(&cvv, self.credentials.cvv()).await?;
		debug!(target = "booker", "card verification entered");
		Ok(())
	}
}
