//! Selector keys and the CSS locators they resolve to on the booking site.
//!
//! The engine only ever names elements by [`SelectorKey`]; the concrete markup
//! lives here so a driver can be pointed at a different skin of the site
//! without touching the search logic.

use std::fmt;

/// Logical elements the engine interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectorKey {
	EmailInput,
	PasswordInput,
	SignInButton,
	/// Any element that only renders for an authenticated patron.
	PostLoginMarker,
	ConsentButton,
	CalendarDay,
	TimeSlot,
	CheckoutForm,
	/// Present inside the checkout form when card verification is required.
	CvvMarker,
	/// CVV input inside the third-party payment widget.
	PaymentCvvInput,
	PurchaseButton,
	ConfirmationId,
}

const KEY_COUNT: usize = 12;

impl SelectorKey {
	pub const ALL: [SelectorKey; KEY_COUNT] = [
		SelectorKey::EmailInput,
		SelectorKey::PasswordInput,
		SelectorKey::SignInButton,
		SelectorKey::PostLoginMarker,
		SelectorKey::ConsentButton,
		SelectorKey::CalendarDay,
		SelectorKey::TimeSlot,
		SelectorKey::CheckoutForm,
		SelectorKey::CvvMarker,
		SelectorKey::PaymentCvvInput,
		SelectorKey::PurchaseButton,
		SelectorKey::ConfirmationId,
	];

	/// Inverse of [`SelectorKey::as_str`].
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|key| key.as_str() == name)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			SelectorKey::EmailInput => "email-input",
			SelectorKey::PasswordInput => "password-input",
			SelectorKey::SignInButton => "sign-in-button",
			SelectorKey::PostLoginMarker => "post-login-marker",
			SelectorKey::ConsentButton => "consent-button",
			SelectorKey::CalendarDay => "calendar-day",
			SelectorKey::TimeSlot => "time-slot",
			SelectorKey::CheckoutForm => "checkout-form",
			SelectorKey::CvvMarker => "cvv-marker",
			SelectorKey::PaymentCvvInput => "payment-cvv-input",
			SelectorKey::PurchaseButton => "purchase-button",
			SelectorKey::ConfirmationId => "confirmation-id",
		}
	}
}

impl fmt::Display for SelectorKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A CSS selector, optionally scoped to the document of an iframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
	/// Selector of the `<iframe>` whose document is searched instead of the page.
	pub frame: Option<String>,
	pub css: String,
}

impl Locator {
	pub fn css(css: impl Into<String>) -> Self {
		Self {
			frame: None,
			css: css.into(),
		}
	}

	pub fn in_frame(frame: impl Into<String>, css: impl Into<String>) -> Self {
		Self {
			frame: Some(frame.into()),
			css: css.into(),
		}
	}
}

/// Locator table for every [`SelectorKey`].
#[derive(Debug, Clone)]
pub struct Selectors {
	locators: [Locator; KEY_COUNT],
}

impl Selectors {
	pub fn get(&self, key: SelectorKey) -> &Locator {
		&self.locators[key as usize]
	}

	/// Replaces the locator for `key`.
	pub fn with(mut self, key: SelectorKey, locator: Locator) -> Self {
		self.locators[key as usize] = locator;
		self
	}
}

impl Default for Selectors {
	fn default() -> Self {
		Self {
			locators: SelectorKey::ALL.map(default_locator),
		}
	}
}

fn default_locator(key: SelectorKey) -> Locator {
	match key {
		SelectorKey::EmailInput => Locator::css("[data-testid=email-input]"),
		SelectorKey::PasswordInput => Locator::css("[data-testid=password-input]"),
		SelectorKey::SignInButton => Locator::css("[data-testid=signin]"),
		// The calendar only renders for a signed-in patron.
		SelectorKey::PostLoginMarker | SelectorKey::CalendarDay => Locator::css("[data-testid=consumer-calendar-day]"),
		SelectorKey::ConsentButton => Locator::css("#truste-consent-required"),
		SelectorKey::TimeSlot => Locator::css("[data-testid=search-result-time] span"),
		SelectorKey::CheckoutForm => Locator::css(".Consumer-contentContainer"),
		SelectorKey::CvvMarker => Locator::css(".Consumer-contentContainer span#cvv"),
		SelectorKey::PaymentCvvInput => Locator::in_frame("iframe[type=cvv]", "#cvv"),
		SelectorKey::PurchaseButton => Locator::css("[data-testid=\"purchase-button\"]"),
		SelectorKey::ConfirmationId => Locator::css("[data-testid=\"receipt-confirmation-id\"]"),
	}
}
