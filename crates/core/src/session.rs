//! Patron authentication, performed at most once per run.

use std::time::Duration;

use tracing::{debug, info};

use crate::criteria::PatronCredentials;
use crate::driver::{PageDriver, first_element};
use crate::error::Result;
use crate::selectors::SelectorKey;

/// Whether the run already holds a signed-in session.
///
/// Starts unauthenticated; once marked it stays authenticated for the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
	authenticated: bool,
}

impl SessionState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	pub(crate) fn mark_authenticated(&mut self) {
		self.authenticated = true;
	}
}

pub struct SessionManager<'a> {
	credentials: &'a PatronCredentials,
	timeout: Duration,
}

impl<'a> SessionManager<'a> {
	/// `timeout` bounds each login-form wait and the post-login marker.
	pub fn new(credentials: &'a PatronCredentials, timeout: Duration) -> Self {
		Self { credentials, timeout }
	}

	/// Signs in unless `session` is already authenticated.
	///
	/// Expects the driver to be showing the login page.
	///
	/// # Errors
	///
	/// Returns [`Error::Timeout`](crate::Error::Timeout) if the login form or
	/// the post-login marker does not render in time.
	pub async fn ensure_authenticated<D: PageDriver + ?Sized>(&self, driver: &D, session: &mut SessionState) -> Result<()> {
		if session.is_authenticated() {
			debug!(target = "booker.session", "reusing authenticated session");
			return Ok(());
		}

		let email = first_element(driver, SelectorKey::EmailInput, self.timeout).await?;
		driver.type_text(&email, self.credentials.email()).await?;

		let password = first_element(driver, SelectorKey::PasswordInput, self.timeout).await?;
		driver.type_text(&password, self.credentials.password()).await?;

		let sign_in = first_element(driver, SelectorKey::SignInButton, self.timeout).await?;
		driver.click(&sign_in).await?;

		driver.wait_for(SelectorKey::PostLoginMarker, self.timeout).await?;
		session.mark_authenticated();
		info!(target = "booker.session", "signed in");
		Ok(())
	}
}
