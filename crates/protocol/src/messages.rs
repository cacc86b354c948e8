//! CDP command, response and event envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command sent to the browser.
///
/// ```json
/// { "id": 7, "method": "Page.navigate", "params": { "url": "https://example.com" }, "sessionId": "A1B2" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	/// Unique request ID for correlating responses.
	pub id: u32,
	/// Domain-qualified method name.
	pub method: String,
	/// Method parameters as a JSON object.
	#[serde(default)]
	pub params: Value,
	/// Flattened target session the command is routed to, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Response to a [`Request`], correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	pub id: u32,
	/// Success result (mutually exclusive with error).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Protocol error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// Unsolicited notification from the browser (no `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Discriminated union of inbound messages.
///
/// Messages carrying an `id` are responses; everything else is an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Response(Response),
	Event(Event),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_omits_missing_session() {
		let request = Request {
			id: 3,
			method: "Target.getTargets".into(),
			params: serde_json::json!({}),
			session_id: None,
		};
		let value = serde_json::to_value(&request).unwrap();
		assert_eq!(value["id"], 3);
		assert!(value.get("sessionId").is_none());
	}

	#[test]
	fn message_with_id_is_response() {
		let json = r#"{"id": 42, "result": {"frameId": "F1"}, "sessionId": "S"}"#;
		match serde_json::from_str::<Message>(json).unwrap() {
			Message::Response(response) => {
				assert_eq!(response.id, 42);
				assert_eq!(response.session_id.as_deref(), Some("S"));
				assert_eq!(response.result.unwrap()["frameId"], "F1");
			}
			Message::Event(_) => panic!("expected response"),
		}
	}

	#[test]
	fn message_without_id_is_event() {
		let json = r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.5}}"#;
		match serde_json::from_str::<Message>(json).unwrap() {
			Message::Event(event) => assert_eq!(event.method, "Page.loadEventFired"),
			Message::Response(_) => panic!("expected event"),
		}
	}

	#[test]
	fn error_response_parses_code_and_message() {
		let json = r#"{"id": 1, "error": {"code": -32000, "message": "Cannot find context with specified id"}}"#;
		let Message::Response(response) = serde_json::from_str::<Message>(json).unwrap() else {
			panic!("expected response");
		};
		let error = response.error.unwrap();
		assert_eq!(error.code, -32000);
		assert!(error.message.contains("context"));
	}
}
