use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn booker_binary() -> PathBuf {
	let mut path = std::env::current_exe().expect("current_exe should resolve");
	path.pop();
	path.pop();
	path.push("booker");
	path
}

fn run_booker(workdir: &Path, args: &[&str]) -> (Option<i32>, String, String) {
	let output = Command::new(booker_binary())
		.current_dir(workdir)
		.args(args)
		.env_remove("BOOKER_EMAIL")
		.env_remove("BOOKER_PASSWORD")
		.env_remove("BOOKER_CVV")
		.env_remove("BOOKER_WEBHOOK_URL")
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to execute booker");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.code(), stdout, stderr)
}

fn write_config(dir: &Path, json: &str) {
	std::fs::write(dir.join("booker.json"), json).expect("config should be written");
}

fn parse(stdout: &str) -> serde_json::Value {
	serde_json::from_str(stdout).unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {stdout}"))
}

#[test]
fn check_prints_resolved_config_without_secrets() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_config(
		tmp.path(),
		r#"{
			"bookingPage": "/acme/search",
			"partySize": 2,
			"desiredDays": ["2024-05-01"],
			"patron": {"email": "secret@example.com", "password": "hunter2", "cvv": "123"}
		}"#,
	);

	let (code, stdout, stderr) = run_booker(tmp.path(), &["-f", "json", "check"]);
	assert_eq!(code, Some(0), "check failed: {stderr}");
	let json = parse(&stdout);
	assert_eq!(json["ok"], true);
	assert_eq!(json["command"], "check");
	assert_eq!(json["data"]["bookingUrl"], "https://www.exploretock.com/acme/search?size=2&date=2024-05-01");
	assert_eq!(json["data"]["retryAttempts"], 5);
	assert_eq!(json["data"]["retryDelayMs"], 10000);
	assert!(!stdout.contains("secret@example.com"));
	assert!(!stdout.contains("hunter2"));
}

#[test]
fn check_applies_flag_and_env_overrides() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_config(tmp.path(), r#"{"bookingPage": "/acme", "partySize": 4}"#);

	let output = Command::new(booker_binary())
		.current_dir(tmp.path())
		.args(["-f", "json", "check", "--dry-run", "--retry-attempts", "1", "--retry-delay", "250"])
		.env("BOOKER_EMAIL", "env@example.com")
		.env("BOOKER_PASSWORD", "pw")
		.env("BOOKER_CVV", "4321")
		.output()
		.expect("failed to execute booker");

	assert!(output.status.success(), "check failed: {}", String::from_utf8_lossy(&output.stderr));
	let json = parse(&String::from_utf8_lossy(&output.stdout));
	assert_eq!(json["data"]["dryRun"], true);
	assert_eq!(json["data"]["retryAttempts"], 1);
	assert_eq!(json["data"]["retryDelayMs"], 250);
}

#[test]
fn check_rejects_invalid_cvv() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_config(
		tmp.path(),
		r#"{"bookingPage": "/acme", "partySize": 2, "patron": {"email": "a@b.c", "password": "pw", "cvv": "12"}}"#,
	);

	let (code, stdout, _) = run_booker(tmp.path(), &["-f", "json", "check"]);
	assert_eq!(code, Some(1));
	let json = parse(&stdout);
	assert_eq!(json["ok"], false);
	assert_eq!(json["error"]["code"], "INVALID_CONFIG");
	assert!(json["error"]["message"].as_str().unwrap().contains("cvv"));
}

#[test]
fn check_reports_missing_config_file() {
	let tmp = TempDir::new().expect("temp dir should be created");

	let (code, stdout, _) = run_booker(tmp.path(), &["-f", "json", "check", "--config", "nope.json"]);
	assert_eq!(code, Some(1));
	let json = parse(&stdout);
	assert_eq!(json["error"]["code"], "INVALID_CONFIG");
	assert!(json["error"]["message"].as_str().unwrap().contains("nope.json"));
}

#[test]
fn book_fails_before_browser_on_invalid_config() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_config(tmp.path(), r#"{"bookingPage": "/acme", "partySize": 0}"#);

	let (code, stdout, _) = run_booker(tmp.path(), &["-f", "json", "book", "--port", "1"]);
	assert_eq!(code, Some(1));
	let json = parse(&stdout);
	assert_eq!(json["command"], "book");
	assert_eq!(json["error"]["code"], "INVALID_CONFIG");
}

#[test]
fn book_reports_unreachable_browser() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_config(
		tmp.path(),
		r#"{"bookingPage": "/acme", "partySize": 2, "patron": {"email": "a@b.c", "password": "pw", "cvv": "123"}}"#,
	);
	let port = std::net::TcpListener::bind("127.0.0.1:0")
		.and_then(|listener| listener.local_addr())
		.expect("ephemeral port should bind")
		.port();

	let (code, stdout, stderr) = run_booker(tmp.path(), &["-f", "json", "book", "--port", &port.to_string()]);
	assert_eq!(code, Some(1), "stdout: {stdout}\nstderr: {stderr}");
	let json = parse(&stdout);
	assert_eq!(json["ok"], false);
	assert_eq!(json["error"]["code"], "BROWSER_LAUNCH_FAILED");
}

#[test]
fn text_output_is_plain_summary() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_config(
		tmp.path(),
		r#"{"bookingPage": "/acme", "partySize": 2, "desiredTimeSlots": ["19:00"], "patron": {"email": "a@b.c", "password": "pw", "cvv": "123"}}"#,
	);

	let (code, stdout, stderr) = run_booker(tmp.path(), &["check"]);
	assert_eq!(code, Some(0), "check failed: {stderr}");
	assert!(stdout.contains("party size:     2"));
	assert!(stdout.contains("time slots:     19:00"));
}
