//! Booking-attempt orchestration for reservation sites.
//!
//! The engine authenticates a patron once per run, scans the site's calendar
//! for open days, searches those days first-fit for an acceptable time slot,
//! completes checkout (or stops short of it in dry-run mode), and retries with
//! a fixed delay while nothing is available.
//!
//! All page interaction goes through the [`PageDriver`] trait. [`CdpDriver`]
//! drives a real Chromium page over the DevTools protocol;
//! [`ScriptedDriver`](driver::scripted::ScriptedDriver) simulates the booking
//! site in memory for tests.
//!
//! # Example
//!
//! ```ignore
//! let criteria = ReservationCriteria::new("/acme/search", 2)?.with_desired_time_slots(["19:00"]);
//! let patron = PatronCredentials::new("me@example.com", "hunter2", "123")?;
//! let driver = CdpDriver::new(browser.new_page().await?);
//!
//! let mut session = SessionState::new();
//! let report = AttemptOrchestrator::new(&driver, &criteria, &patron)?.run(&mut session).await?;
//! println!("{}", report.outcome);
//! ```

pub mod config;
pub mod criteria;
pub mod driver;
pub mod error;
pub mod matcher;
pub mod navigation;
pub mod orchestrator;
pub mod scanner;
pub mod selectors;
pub mod session;
pub mod submitter;

pub use config::{PatronConfig, ReservationConfig};
pub use criteria::{PatronCredentials, ReservationCriteria, StepTimeouts};
pub use driver::cdp::CdpDriver;
pub use driver::{ElementHandle, PageDriver};
pub use error::{Error, Result};
pub use matcher::{BookingMatch, SlotCandidate, SlotMatcher};
pub use navigation::BookingUrls;
pub use orchestrator::{AttemptOrchestrator, BookingOutcome, Phase, RunReport, Shortfall};
pub use scanner::{AvailabilityScanner, DayCandidate};
pub use selectors::{Locator, SelectorKey, Selectors};
pub use session::{SessionManager, SessionState};
pub use submitter::{BookingSubmitter, Confirmation};
