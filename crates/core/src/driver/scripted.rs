//! In-memory [`PageDriver`] that plays a scripted booking site.
//!
//! The site has a login form, a calendar of days each carrying time slots, a
//! checkout form with an optional payment widget, and a receipt. Every call is
//! recorded so tests can assert on exactly what the engine did.
//!
//! Each navigation loads the next scripted calendar; the last one repeats.
//! Waits resolve immediately: present elements are returned, absent ones time
//! out at once. With [`ScriptedDriver::with_lagging_slots`] the slot list keeps
//! showing the previously selected day for a few reads after a day is clicked.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ElementHandle, PageDriver};
use crate::error::{Error, Result};
use crate::selectors::SelectorKey;

/// One calendar day as the scripted site renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedDay {
	pub label: String,
	pub aria_disabled: bool,
	pub available_class: bool,
	pub slots: Vec<String>,
}

impl ScriptedDay {
	/// A bookable day offering `slots`.
	pub fn open<I, S>(label: &str, slots: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			label: label.to_string(),
			aria_disabled: false,
			available_class: true,
			slots: slots.into_iter().map(Into::into).collect(),
		}
	}

	/// A day rendered with `aria-disabled="true"`.
	pub fn disabled(label: &str) -> Self {
		Self {
			label: label.to_string(),
			aria_disabled: true,
			available_class: false,
			slots: Vec::new(),
		}
	}

	/// An enabled day without the `is-available` class.
	pub fn sold_out(label: &str) -> Self {
		Self {
			label: label.to_string(),
			aria_disabled: false,
			available_class: false,
			slots: Vec::new(),
		}
	}
}

/// A driver call as observed by the scripted site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
	Navigate(String),
	Query(SelectorKey),
	WaitFor(SelectorKey),
	Click(SelectorKey),
	Type(SelectorKey, String),
	Screenshot,
}

#[derive(Debug, Clone, Copy)]
enum Target {
	Single(SelectorKey),
	Day(usize),
	Slot { day: usize, slot: usize },
}

#[derive(Debug)]
struct SiteState {
	calendars: Vec<Vec<ScriptedDay>>,
	current: usize,
	navigations: usize,
	login_works: bool,
	calendar_renders: bool,
	payment_required: bool,
	payment_widget_ready: bool,
	confirmation_id: Option<String>,
	consent_modal: bool,
	slot_lag: usize,

	authenticated: bool,
	on_login_page: bool,
	consent_visible: bool,
	selected_day: Option<usize>,
	shown_day: Option<usize>,
	stale_reads: usize,
	chosen_slot: Option<(usize, usize)>,
	purchased: bool,

	next_handle: u64,
	handles: HashMap<u64, Target>,
	calls: Vec<DriverCall>,
}

impl SiteState {
	fn calendar(&self) -> &[ScriptedDay] {
		self.calendars.get(self.current).map(Vec::as_slice).unwrap_or_default()
	}

	fn handle(&mut self, key: SelectorKey, target: Target, label: Option<String>, text: String, attributes: BTreeMap<String, String>) -> ElementHandle {
		self.next_handle += 1;
		self.handles.insert(self.next_handle, target);
		ElementHandle {
			id: self.next_handle,
			key,
			label,
			text,
			attributes,
		}
	}

	fn single(&mut self, key: SelectorKey, text: &str) -> Vec<ElementHandle> {
		vec![self.handle(key, Target::Single(key), None, text.to_string(), BTreeMap::new())]
	}

	fn checkout_open(&self) -> bool {
		self.chosen_slot.is_some()
	}

	/// Elements currently rendered for `key`.
	fn visible(&mut self, key: SelectorKey) -> Vec<ElementHandle> {
		let login_form = self.on_login_page && !self.authenticated;
		match key {
			SelectorKey::EmailInput | SelectorKey::PasswordInput | SelectorKey::SignInButton if login_form => self.single(key, ""),
			SelectorKey::PostLoginMarker if self.authenticated => self.single(key, ""),
			SelectorKey::ConsentButton if self.consent_visible => self.single(key, "Accept"),
			SelectorKey::CalendarDay if self.authenticated && self.calendar_renders && !self.checkout_open() => {
				let days = self.calendar().to_vec();
				days.into_iter()
					.enumerate()
					.map(|(index, day)| {
						let mut class = "ConsumerCalendar-day".to_string();
						if day.available_class {
							class.push_str(" is-available");
						}
						let attributes = BTreeMap::from([
							("aria-disabled".to_string(), day.aria_disabled.to_string()),
							("class".to_string(), class),
						]);
						self.handle(key, Target::Day(index), Some(day.label.clone()), String::new(), attributes)
					})
					.collect()
			}
			SelectorKey::TimeSlot if !self.checkout_open() => {
				let shown = if self.stale_reads > 0 {
					self.stale_reads -= 1;
					self.shown_day
				} else {
					self.shown_day = self.selected_day;
					self.selected_day
				};
				let Some(day) = shown else {
					return Vec::new();
				};
				let slots = self.calendar().get(day).map(|d| d.slots.clone()).unwrap_or_default();
				slots
					.into_iter()
					.enumerate()
					.map(|(slot, text)| self.handle(key, Target::Slot { day, slot }, None, text, BTreeMap::new()))
					.collect()
			}
			SelectorKey::CheckoutForm if self.checkout_open() => self.single(key, ""),
			SelectorKey::CvvMarker if self.checkout_open() && self.payment_required => self.single(key, ""),
			SelectorKey::PaymentCvvInput if self.checkout_open() && self.payment_required && self.payment_widget_ready => {
				self.single(key, "")
			}
			SelectorKey::PurchaseButton if self.checkout_open() && !self.purchased => self.single(key, "Complete purchase"),
			SelectorKey::ConfirmationId if self.purchased => match self.confirmation_id.clone() {
				Some(id) => self.single(key, &id),
				None => Vec::new(),
			},
			_ => Vec::new(),
		}
	}
}

/// Scripted booking site. See the module docs for its behavior.
#[derive(Debug)]
pub struct ScriptedDriver {
	state: Mutex<SiteState>,
}

impl ScriptedDriver {
	/// A site whose every visit shows `calendar`.
	pub fn new(calendar: Vec<ScriptedDay>) -> Self {
		Self {
			state: Mutex::new(SiteState {
				calendars: vec![calendar],
				current: 0,
				navigations: 0,
				login_works: true,
				calendar_renders: true,
				payment_required: false,
				payment_widget_ready: true,
				confirmation_id: Some("CONF-1".to_string()),
				consent_modal: false,
				slot_lag: 0,
				authenticated: false,
				on_login_page: false,
				consent_visible: false,
				selected_day: None,
				shown_day: None,
				stale_reads: 0,
				chosen_slot: None,
				purchased: false,
				next_handle: 0,
				handles: HashMap::new(),
				calls: Vec::new(),
			}),
		}
	}

	/// Appends a calendar shown from the next visit on.
	pub fn then_calendar(mut self, calendar: Vec<ScriptedDay>) -> Self {
		self.state.get_mut().calendars.push(calendar);
		self
	}

	/// Sign-in never produces the post-login marker.
	pub fn with_login_failure(mut self) -> Self {
		self.state.get_mut().login_works = false;
		self
	}

	/// The calendar widget never renders.
	pub fn with_unrendered_calendar(mut self) -> Self {
		self.state.get_mut().calendar_renders = false;
		self
	}

	/// Checkout shows the card-verification marker; `widget_ready` controls
	/// whether the payment widget's input ever appears.
	pub fn with_payment(mut self, widget_ready: bool) -> Self {
		let state = self.state.get_mut();
		state.payment_required = true;
		state.payment_widget_ready = widget_ready;
		self
	}

	/// Receipt id shown after purchase; `None` means the receipt never renders.
	pub fn with_confirmation(mut self, id: Option<&str>) -> Self {
		self.state.get_mut().confirmation_id = id.map(str::to_string);
		self
	}

	/// A cookie-consent modal appears after every navigation.
	pub fn with_consent_modal(mut self) -> Self {
		self.state.get_mut().consent_modal = true;
		self
	}

	/// After each day click the next `reads` slot queries still show the
	/// previously rendered day.
	pub fn with_lagging_slots(mut self, reads: usize) -> Self {
		self.state.get_mut().slot_lag = reads;
		self
	}

	/// The browser already carries a signed-in session.
	pub fn signed_in(mut self) -> Self {
		self.state.get_mut().authenticated = true;
		self
	}

	pub fn calls(&self) -> Vec<DriverCall> {
		self.state.lock().calls.clone()
	}

	pub fn navigations(&self) -> Vec<String> {
		self.state
			.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				DriverCall::Navigate(url) => Some(url.clone()),
				_ => None,
			})
			.collect()
	}

	/// Number of calendar scans, counted as waits on the calendar widget.
	pub fn scans(&self) -> usize {
		self.count(|call| *call == DriverCall::WaitFor(SelectorKey::CalendarDay))
	}

	pub fn clicks_on(&self, key: SelectorKey) -> usize {
		self.count(|call| *call == DriverCall::Click(key))
	}

	pub fn typed(&self, key: SelectorKey) -> Vec<String> {
		self.state
			.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				DriverCall::Type(k, text) if *k == key => Some(text.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn is_authenticated(&self) -> bool {
		self.state.lock().authenticated
	}

	pub fn purchased(&self) -> bool {
		self.state.lock().purchased
	}

	/// Labels of the day and slot the checkout was opened for.
	pub fn chosen_slot(&self) -> Option<(String, String)> {
		let state = self.state.lock();
		let (day, slot) = state.chosen_slot?;
		let day = state.calendar().get(day)?;
		Some((day.label.clone(), day.slots.get(slot)?.clone()))
	}

	fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
		self.state.lock().calls.iter().filter(|call| pred(call)).count()
	}
}

#[async_trait]
impl PageDriver for ScriptedDriver {
	async fn navigate(&self, url: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Navigate(url.to_string()));

		state.current = state.navigations.min(state.calendars.len().saturating_sub(1));
		state.navigations += 1;
		state.on_login_page = url.contains("/login");
		state.consent_visible = state.consent_modal;
		state.selected_day = None;
		state.shown_day = None;
		state.stale_reads = 0;
		state.chosen_slot = None;
		state.purchased = false;
		state.handles.clear();
		Ok(())
	}

	async fn query_elements(&self, key: SelectorKey) -> Result<Vec<ElementHandle>> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Query(key));
		Ok(state.visible(key))
	}

	async fn click(&self, element: &ElementHandle) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Click(element.key));

		let target = *state
			.handles
			.get(&element.id)
			.ok_or_else(|| Error::ElementNotFound(format!("{} #{}", element.key, element.id)))?;
		match target {
			Target::Single(SelectorKey::SignInButton) => {
				if state.login_works {
					state.authenticated = true;
					state.on_login_page = false;
				}
			}
			Target::Single(SelectorKey::ConsentButton) => state.consent_visible = false,
			Target::Single(SelectorKey::PurchaseButton) => state.purchased = true,
			Target::Single(_) => {}
			Target::Day(day) => {
				state.selected_day = Some(day);
				state.stale_reads = state.slot_lag;
			}
			Target::Slot { day, slot } => state.chosen_slot = Some((day, slot)),
		}
		Ok(())
	}

	async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Type(element.key, text.to_string()));
		if !state.handles.contains_key(&element.id) {
			return Err(Error::ElementNotFound(format!("{} #{}", element.key, element.id)));
		}
		Ok(())
	}

	async fn wait_for(&self, key: SelectorKey, timeout: Duration) -> Result<Vec<ElementHandle>> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::WaitFor(key));
		let found = state.visible(key);
		if found.is_empty() {
			return Err(Error::Timeout {
				ms: timeout.as_millis() as u64,
				condition: key.to_string(),
			});
		}
		Ok(found)
	}

	async fn capture_screenshot(&self) -> Result<Option<Vec<u8>>> {
		self.state.lock().calls.push(DriverCall::Screenshot);
		Ok(Some(b"\x89PNG\r\n\x1a\n".to_vec()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn calendar_advances_per_navigation_and_last_repeats() {
		let driver = ScriptedDriver::new(vec![ScriptedDay::disabled("d1")])
			.then_calendar(vec![ScriptedDay::open("d2", ["19:00"])])
			.signed_in();

		for expected in ["d1", "d2", "d2"] {
			driver.navigate("https://site/acme").await.unwrap();
			let days = driver.query_elements(SelectorKey::CalendarDay).await.unwrap();
			assert_eq!(days[0].label.as_deref(), Some(expected));
		}
	}

	#[tokio::test]
	async fn sign_in_reveals_post_login_marker() {
		let driver = ScriptedDriver::new(vec![]);
		driver.navigate("https://site/login?continue=%2Facme").await.unwrap();
		assert!(driver.query_elements(SelectorKey::PostLoginMarker).await.unwrap().is_empty());

		let button = driver.wait_for(SelectorKey::SignInButton, Duration::from_secs(1)).await.unwrap();
		driver.click(&button[0]).await.unwrap();
		assert!(driver.is_authenticated());
		assert_eq!(driver.query_elements(SelectorKey::PostLoginMarker).await.unwrap().len(), 1);
		assert!(driver.query_elements(SelectorKey::EmailInput).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn absent_elements_time_out_immediately() {
		let driver = ScriptedDriver::new(vec![]);
		let err = driver.wait_for(SelectorKey::CheckoutForm, Duration::from_secs(10)).await.unwrap_err();
		assert!(err.is_timeout());
		assert_eq!(driver.calls(), vec![DriverCall::WaitFor(SelectorKey::CheckoutForm)]);
	}

	#[tokio::test]
	async fn stale_handles_are_rejected_after_navigation() {
		let driver = ScriptedDriver::new(vec![ScriptedDay::open("d1", ["19:00"])]).signed_in();
		driver.navigate("https://site/acme").await.unwrap();
		let days = driver.query_elements(SelectorKey::CalendarDay).await.unwrap();
		driver.navigate("https://site/acme").await.unwrap();

		let err = driver.click(&days[0]).await.unwrap_err();
		assert!(matches!(err, Error::ElementNotFound(_)));
	}

	#[tokio::test]
	async fn lagging_slots_show_previous_day_first() {
		let driver = ScriptedDriver::new(vec![ScriptedDay::open("d1", ["19:00"]), ScriptedDay::open("d2", ["17:00"])])
			.with_lagging_slots(1)
			.signed_in();
		driver.navigate("https://site/acme").await.unwrap();
		let days = driver.query_elements(SelectorKey::CalendarDay).await.unwrap();

		driver.click(&days[0]).await.unwrap();
		assert!(driver.query_elements(SelectorKey::TimeSlot).await.unwrap().is_empty());
		assert_eq!(driver.query_elements(SelectorKey::TimeSlot).await.unwrap()[0].text, "19:00");

		driver.click(&days[1]).await.unwrap();
		assert_eq!(driver.query_elements(SelectorKey::TimeSlot).await.unwrap()[0].text, "19:00");
		assert_eq!(driver.query_elements(SelectorKey::TimeSlot).await.unwrap()[0].text, "17:00");
	}
}
