//! Booking and login URLs for a set of criteria.

use url::Url;

use crate::criteria::ReservationCriteria;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingUrls {
	booking: Url,
	login: Url,
}

impl BookingUrls {
	/// Resolves the booking page against the site origin and adds the party
	/// size and, when days are preferred, the first preferred day.
	pub fn new(criteria: &ReservationCriteria) -> Result<Self> {
		let mut booking = criteria.site_origin().join(criteria.booking_page())?;
		{
			let mut query = booking.query_pairs_mut();
			query.append_pair("size", &criteria.party_size().to_string());
			if let Some(day) = criteria.desired_days().first() {
				query.append_pair("date", day);
			}
		}

		let mut continue_to = booking.path().to_string();
		if let Some(query) = booking.query() {
			continue_to.push('?');
			continue_to.push_str(query);
		}
		let mut login = booking.join("/login")?;
		login.query_pairs_mut().append_pair("continue", &continue_to);

		Ok(Self { booking, login })
	}

	pub fn booking_url(&self) -> &str {
		self.booking.as_str()
	}

	/// Login page that continues to the booking page after sign-in.
	pub fn login_url(&self) -> &str {
		self.login.as_str()
	}

	/// Where an attempt starts: the login page until the session is authenticated.
	pub fn visit_url(&self, authenticated: bool) -> &str {
		if authenticated { self.booking_url() } else { self.login_url() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn booking_url_carries_size_and_first_desired_day() {
		let criteria = ReservationCriteria::new("/acme/search", 4)
			.unwrap()
			.with_desired_days(["2024-05-03", "2024-05-01"]);
		let urls = BookingUrls::new(&criteria).unwrap();
		assert_eq!(urls.booking_url(), "https://www.exploretock.com/acme/search?size=4&date=2024-05-03");
	}

	#[test]
	fn booking_url_without_desired_days_has_no_date() {
		let criteria = ReservationCriteria::new("/acme/search", 2).unwrap();
		let urls = BookingUrls::new(&criteria).unwrap();
		assert_eq!(urls.booking_url(), "https://www.exploretock.com/acme/search?size=2");
	}

	#[test]
	fn login_url_encodes_continue_target() {
		let criteria = ReservationCriteria::new("/acme/search", 2).unwrap();
		let urls = BookingUrls::new(&criteria).unwrap();
		assert_eq!(
			urls.login_url(),
			"https://www.exploretock.com/login?continue=%2Facme%2Fsearch%3Fsize%3D2"
		);
	}

	#[test]
	fn absolute_booking_page_overrides_origin() {
		let criteria = ReservationCriteria::new("http://127.0.0.1:8080/acme", 2).unwrap();
		let urls = BookingUrls::new(&criteria).unwrap();
		assert_eq!(urls.booking_url(), "http://127.0.0.1:8080/acme?size=2");
		assert!(urls.login_url().starts_with("http://127.0.0.1:8080/login?continue="));
	}

	#[test]
	fn visit_url_depends_on_session() {
		let criteria = ReservationCriteria::new("/acme", 2).unwrap();
		let urls = BookingUrls::new(&criteria).unwrap();
		assert_eq!(urls.visit_url(true), urls.booking_url());
		assert_eq!(urls.visit_url(false), urls.login_url());
	}
}
