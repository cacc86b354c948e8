//! CDP connection and page session against an in-process debugger endpoint.

use std::sync::Arc;
use std::time::Duration;

use booker_runtime::{Browser, CdpPage, Connection, Error, FrameScope};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

/// Minimal stand-in for a browser's debugger socket. Records every request.
async fn start_fake_browser() -> (String, Arc<Mutex<Vec<Value>>>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let log = Arc::clone(&seen);

	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let (mut tx, mut rx) = ws.split();

		while let Some(Ok(frame)) = rx.next().await {
			let Message::Text(text) = frame else { continue };
			let request: Value = serde_json::from_str(&text).unwrap();
			log.lock().await.push(request.clone());

			let id = request["id"].clone();
			let reply = match request["method"].as_str().unwrap() {
				"Target.createTarget" => json!({ "id": id, "result": { "targetId": "T1" } }),
				"Target.attachToTarget" if request["params"]["targetId"] == "IF1" => json!({ "id": id, "result": { "sessionId": "S2" } }),
				"Target.attachToTarget" => json!({ "id": id, "result": { "sessionId": "S1" } }),
				"Target.getTargets" => json!({
					"id": id,
					"result": { "targetInfos": [
						{ "targetId": "T1", "type": "page", "url": "https://example.com/" },
						{ "targetId": "IF1", "type": "iframe", "url": "https://pay.example/cvv" }
					] }
				}),
				"Page.getFrameTree" => json!({
					"id": id,
					"result": { "frameTree": {
						"frame": { "id": "F1", "url": "https://example.com/" },
						"childFrames": [{ "frame": { "id": "F2", "url": "https://example.com/inner" } }]
					} }
				}),
				"Page.createIsolatedWorld" => json!({ "id": id, "result": { "executionContextId": 7 } }),
				"Page.navigate" if request["params"]["url"] == "https://unreachable.invalid/" => {
					json!({ "id": id, "result": { "frameId": "F1", "errorText": "net::ERR_NAME_NOT_RESOLVED" } })
				}
				"Page.navigate" => json!({ "id": id, "result": { "frameId": "F1" } }),
				"Runtime.evaluate" => match request["params"]["expression"].as_str().unwrap() {
					"document.readyState" => json!({ "id": id, "result": { "result": { "type": "string", "value": "complete" } } }),
					"1 + 1" => json!({ "id": id, "result": { "result": { "type": "number", "value": 2 } } }),
					e if e.contains("iframe#pay") => json!({ "id": id, "result": { "result": { "type": "string", "value": "https://pay.example/cvv" } } }),
					e if e.contains("iframe#same") => json!({ "id": id, "result": { "result": { "type": "string", "value": "https://example.com/inner" } } }),
					e if e.contains("iframe#missing") => json!({ "id": id, "result": { "result": { "type": "object", "subtype": "null", "value": null } } }),
					_ => json!({
						"id": id,
						"result": {
							"result": { "type": "object" },
							"exceptionDetails": { "text": "Uncaught", "exception": { "type": "object", "description": "ReferenceError: nope is not defined" } }
						}
					}),
				},
				"Page.captureScreenshot" => json!({ "id": id, "result": { "data": "UE5H" } }),
				"Page.enable" | "Runtime.enable" | "Input.insertText" | "Target.closeTarget" => json!({ "id": id, "result": {} }),
				other => json!({ "id": id, "error": { "code": -32601, "message": format!("'{other}' wasn't found") } }),
			};

			// An unsolicited event ahead of each reply exercises event skipping.
			let event = json!({ "method": "Page.frameNavigated", "params": {} });
			tx.send(Message::Text(event.to_string().into())).await.unwrap();
			tx.send(Message::Text(reply.to_string().into())).await.unwrap();
		}
	});

	(format!("ws://{addr}"), seen)
}

#[tokio::test]
async fn page_session_routes_commands_through_session_id() {
	let (url, seen) = start_fake_browser().await;
	let connection = Connection::connect(&url).await.unwrap();
	let page = CdpPage::open(Arc::clone(&connection)).await.unwrap();
	assert_eq!(page.target_id(), "T1");

	page.navigate("https://example.com/", Duration::from_secs(2)).await.unwrap();
	assert_eq!(page.evaluate("1 + 1").await.unwrap(), json!(2));
	page.insert_text("4242").await.unwrap();

	let requests = seen.lock().await.clone();
	let navigate = requests.iter().find(|r| r["method"] == "Page.navigate").unwrap();
	assert_eq!(navigate["sessionId"], "S1");
	assert_eq!(navigate["params"]["url"], "https://example.com/");

	let create = requests.iter().find(|r| r["method"] == "Target.createTarget").unwrap();
	assert!(create.get("sessionId").is_none());

	let ids: Vec<u64> = requests.iter().map(|r| r["id"].as_u64().unwrap()).collect();
	assert!(ids.windows(2).all(|w| w[0] < w[1]), "request ids should be unique and increasing: {ids:?}");
}

#[tokio::test]
async fn script_exceptions_surface_as_errors() {
	let (url, _) = start_fake_browser().await;
	let connection = Connection::connect(&url).await.unwrap();
	let page = CdpPage::open(connection).await.unwrap();

	match page.evaluate("nope()").await.unwrap_err() {
		Error::Script(message) => assert!(message.contains("ReferenceError")),
		other => panic!("expected script error, got {other:?}"),
	}
}

#[tokio::test]
async fn navigation_error_text_fails_navigation() {
	let (url, _) = start_fake_browser().await;
	let page = CdpPage::open(Connection::connect(&url).await.unwrap()).await.unwrap();

	let err = page.navigate("https://unreachable.invalid/", Duration::from_secs(1)).await.unwrap_err();
	assert!(matches!(err, Error::Navigation { .. }));
}

#[tokio::test]
async fn screenshot_is_base64_decoded() {
	let (url, _) = start_fake_browser().await;
	let page = CdpPage::open(Connection::connect(&url).await.unwrap()).await.unwrap();
	assert_eq!(page.capture_screenshot().await.unwrap(), b"PNG".to_vec());
}

#[tokio::test]
async fn unknown_method_returns_protocol_error() {
	let (url, _) = start_fake_browser().await;
	let connection = Connection::connect(&url).await.unwrap();

	match connection.send_command(None, "Foo.bar", json!({})).await.unwrap_err() {
		Error::Protocol { code, .. } => assert_eq!(code, -32601),
		other => panic!("expected protocol error, got {other:?}"),
	}
	assert!(connection.is_open());
}

#[tokio::test]
async fn out_of_process_frame_gets_its_own_session() {
	let (url, seen) = start_fake_browser().await;
	let page = CdpPage::open(Connection::connect(&url).await.unwrap()).await.unwrap();

	let scope = page.resolve_frame("iframe#pay").await.unwrap();
	assert_eq!(scope, Some(FrameScope::Session("S2".into())));
	assert_eq!(page.resolve_frame("iframe#pay").await.unwrap(), scope);

	let scope = scope.unwrap();
	assert_eq!(page.evaluate_in(&scope, "1 + 1").await.unwrap(), json!(2));
	page.insert_text_in(&scope, "123").await.unwrap();

	let requests = seen.lock().await.clone();
	let frame_attaches = requests
		.iter()
		.filter(|r| r["method"] == "Target.attachToTarget" && r["params"]["targetId"] == "IF1")
		.count();
	assert_eq!(frame_attaches, 1, "frame session should be reused");

	let typed = requests.iter().find(|r| r["method"] == "Input.insertText").unwrap();
	assert_eq!(typed["sessionId"], "S2");
	assert_eq!(typed["params"]["text"], "123");
	let evaluated = requests.iter().rev().find(|r| r["method"] == "Runtime.evaluate").unwrap();
	assert_eq!(evaluated["sessionId"], "S2");
}

#[tokio::test]
async fn same_process_frame_uses_isolated_world() {
	let (url, seen) = start_fake_browser().await;
	let page = CdpPage::open(Connection::connect(&url).await.unwrap()).await.unwrap();

	let scope = page.resolve_frame("iframe#same").await.unwrap().unwrap();
	assert_eq!(scope, FrameScope::Context(7));
	assert_eq!(page.evaluate_in(&scope, "1 + 1").await.unwrap(), json!(2));

	let requests = seen.lock().await.clone();
	let world = requests.iter().find(|r| r["method"] == "Page.createIsolatedWorld").unwrap();
	assert_eq!(world["params"]["frameId"], "F2");
	assert_eq!(world["sessionId"], "S1");
	let evaluated = requests.iter().rev().find(|r| r["method"] == "Runtime.evaluate").unwrap();
	assert_eq!(evaluated["params"]["contextId"], 7);
	assert_eq!(evaluated["sessionId"], "S1");
}

#[tokio::test]
async fn missing_frame_element_resolves_to_none() {
	let (url, _) = start_fake_browser().await;
	let page = CdpPage::open(Connection::connect(&url).await.unwrap()).await.unwrap();
	assert_eq!(page.resolve_frame("iframe#missing").await.unwrap(), None);
}

#[tokio::test]
async fn closed_browser_hands_out_no_pages() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		ws.close(None).await.unwrap();
	});

	let browser = Browser::connect(&format!("ws://{addr}")).await.unwrap();
	tokio::time::sleep(Duration::from_millis(200)).await;

	let err = browser.new_page().await.err().expect("a closed socket should not open pages");
	assert!(matches!(err, Error::ChannelClosed));
}
