//! Chrome DevTools Protocol runtime for booker.
//!
//! Owns everything between a Chromium process and a page session:
//!
//! - [`process`] - port and process lifecycle helpers
//! - [`launcher`] - locating and launching a Chromium executable with remote debugging
//! - [`discovery`] - resolving a WebSocket debugger URL from the DevTools HTTP endpoint
//! - [`connection`] - request/response correlation over the debugger WebSocket
//! - [`page`] - a single attached page target and its child frames (navigate, evaluate, type, screenshot)
//! - [`browser`] - a connected browser that hands out pages

pub mod browser;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod launcher;
pub mod page;
pub mod process;

/// Default timeout in milliseconds for a single protocol command.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 30_000;

pub use browser::Browser;
pub use connection::Connection;
pub use error::{Error, Result};
pub use launcher::{ChromeProcess, LaunchOptions};
pub use page::{CdpPage, FrameScope};
