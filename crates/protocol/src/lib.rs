//! Wire types for the Chrome DevTools Protocol subset used by booker.
//!
//! This crate contains the serde-serializable types exchanged with a Chromium
//! browser over its remote-debugging WebSocket, plus the JSON shape returned by
//! the element query scripts the page driver evaluates. These types represent
//! the "protocol layer" - the shapes of data as they appear on the wire.
//!
//! Types in this crate are pure data with no behavior beyond
//! serialization/deserialization. Higher-level APIs are built on top of them
//! in `booker-runtime` and `booker-rs`.

pub mod discovery;
pub mod element;
pub mod messages;
pub mod runtime;

pub use discovery::*;
pub use element::*;
pub use messages::*;
pub use runtime::*;
