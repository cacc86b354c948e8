//! Request/response correlation over the DevTools WebSocket.
//!
//! Every command gets a sequential id and a oneshot channel; a background read
//! loop parses inbound frames and completes the matching channel. Frames
//! without an id are protocol events and are only traced.
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send_command`] with an optional session id, method, and params
//! 2. The connection allocates an id and parks a oneshot sender under it
//! 3. The request is serialized and written to the socket
//! 4. The read loop receives the response, removes the sender by id, and completes it
//! 5. The caller's future resolves with the result or the protocol error

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use booker_protocol::{ErrorPayload, Message, Request};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::DEFAULT_COMMAND_TIMEOUT_MS;
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Callbacks = Arc<Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// Live connection to a browser's debugger WebSocket.
///
/// Safe to share behind an `Arc`; concurrent commands are correlated by id.
pub struct Connection {
	last_id: AtomicU32,
	callbacks: Callbacks,
	sink: tokio::sync::Mutex<SplitSink<WsStream, WsMessage>>,
	reader: JoinHandle<()>,
	command_timeout: Duration,
}

impl Connection {
	/// Connects to `ws_url` and starts the read loop.
	pub async fn connect(ws_url: &str) -> Result<Arc<Self>> {
		debug!(target = "booker.cdp", %ws_url, "connecting to debugger endpoint");
		let (stream, _) = tokio_tungstenite::connect_async(ws_url).await?;
		let (sink, stream) = stream.split();

		let callbacks: Callbacks = Arc::new(Mutex::new(HashMap::new()));
		let reader = tokio::spawn(read_loop(stream, Arc::clone(&callbacks)));

		Ok(Arc::new(Self {
			last_id: AtomicU32::new(0),
			callbacks,
			sink: tokio::sync::Mutex::new(sink),
			reader,
			command_timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
		}))
	}

	/// Sends a command and awaits its result.
	///
	/// `session_id` routes the command to an attached target; `None` addresses
	/// the browser itself.
	pub async fn send_command(&self, session_id: Option<&str>, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(id, tx);

		let request = Request {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_string),
		};
		let text = serde_json::to_string(&request)?;
		trace!(target = "booker.cdp", id, %method, "send");

		if let Err(err) = self.sink.lock().await.send(WsMessage::Text(text.into())).await {
			self.callbacks.lock().remove(&id);
			return Err(err.into());
		}

		match tokio::time::timeout(self.command_timeout, rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(Error::ChannelClosed),
			Err(_) => {
				self.callbacks.lock().remove(&id);
				Err(Error::Timeout {
					what: method.to_string(),
					timeout: self.command_timeout,
				})
			}
		}
	}

	/// Returns `true` while the read loop is still running.
	pub fn is_open(&self) -> bool {
		!self.reader.is_finished()
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		self.reader.abort();
	}
}

async fn read_loop(mut stream: SplitStream<WsStream>, callbacks: Callbacks) {
	while let Some(frame) = stream.next().await {
		let text = match frame {
			Ok(WsMessage::Text(text)) => text,
			Ok(WsMessage::Close(_)) => break,
			Ok(_) => continue,
			Err(err) => {
				warn!(target = "booker.cdp", error = %err, "debugger socket error");
				break;
			}
		};

		match serde_json::from_str::<Message>(&text) {
			Ok(message) => {
				if let Err(err) = dispatch(&callbacks, message) {
					warn!(target = "booker.cdp", error = %err, "failed to dispatch message");
				}
			}
			Err(err) => warn!(target = "booker.cdp", error = %err, "unparseable debugger message"),
		}
	}

	debug!(target = "booker.cdp", "debugger read loop ended");
	// Dropping the senders resolves every pending command with ChannelClosed.
	callbacks.lock().clear();
}

fn dispatch(callbacks: &Callbacks, message: Message) -> Result<()> {
	match message {
		Message::Response(response) => {
			let callback = callbacks.lock().remove(&response.id).ok_or_else(|| Error::Protocol {
				code: 0,
				message: format!("Cannot find request to respond: id={}", response.id),
			})?;

			let result = match response.error {
				Some(error) => Err(protocol_error(error)),
				None => Ok(response.result.unwrap_or(Value::Null)),
			};
			let _ = callback.send(result);
			Ok(())
		}
		Message::Event(event) => {
			trace!(
				target = "booker.cdp",
				method = %event.method,
				session = ?event.session_id,
				"event"
			);
			Ok(())
		}
	}
}

fn protocol_error(error: ErrorPayload) -> Error {
	let message = match error.data {
		Some(data) => format!("{} ({data})", error.message),
		None => error.message,
	};
	Error::Protocol { code: error.code, message }
}
