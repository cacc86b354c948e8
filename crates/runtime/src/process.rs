//! Port and process lifecycle helpers for launched browsers.

use std::path::PathBuf;

/// Returns `true` when `port` can be bound on localhost.
pub fn port_available(port: u16) -> bool {
	std::net::TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Picks a remote-debugging port: `preferred` when it is free, otherwise an
/// OS-assigned ephemeral port.
pub fn pick_debugging_port(preferred: Option<u16>) -> std::io::Result<u16> {
	if let Some(port) = preferred.filter(|p| port_available(*p)) {
		return Ok(port);
	}
	let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
	Ok(listener.local_addr()?.port())
}

/// Per-port scratch profile directory for a launched browser.
pub fn scratch_profile_dir(port: u16) -> PathBuf {
	std::env::temp_dir().join(format!("booker-profile-{port}"))
}
