//! Result shapes for `Runtime.evaluate`, `Target.*` and `Page.*` commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mirror object returned by `Runtime.evaluate` with `returnByValue: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub value: Option<Value>,
	#[serde(default)]
	pub description: Option<String>,
}

/// Details of a script exception raised during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	pub text: String,
	#[serde(default)]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best available human-readable description of the exception.
	pub fn message(&self) -> &str {
		self.exception
			.as_ref()
			.and_then(|e| e.description.as_deref())
			.unwrap_or(&self.text)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(default)]
	pub exception_details: Option<ExceptionDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
	pub target_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
	pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
	pub frame_id: String,
	#[serde(default)]
	pub error_text: Option<String>,
}

/// One entry of `Target.getTargets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub target_id: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
	pub target_infos: Vec<TargetInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
	pub id: String,
	#[serde(default)]
	pub url: String,
}

/// Frames hosted by the page's own renderer. Out-of-process frames show up
/// as separate `iframe` targets instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTree {
	pub frame: Frame,
	#[serde(default)]
	pub child_frames: Vec<FrameTree>,
}

impl FrameTree {
	/// Depth-first search of the child frames for the first one accepted by `matches`.
	pub fn find_child(&self, matches: &dyn Fn(&Frame) -> bool) -> Option<&Frame> {
		self.child_frames
			.iter()
			.find_map(|child| if matches(&child.frame) { Some(&child.frame) } else { child.find_child(matches) })
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFrameTreeResult {
	pub frame_tree: FrameTree,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIsolatedWorldResult {
	pub execution_context_id: i64,
}

/// `Page.captureScreenshot` result; `data` is base64-encoded image bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureScreenshotResult {
	pub data: String,
}
