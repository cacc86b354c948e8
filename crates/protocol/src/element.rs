//! Element snapshots returned by the page driver's query scripts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Serialized view of one DOM element at query time.
///
/// The `handle` is a page-unique tag written onto the element by the query
/// script so later click/type commands can find it again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
	pub handle: u64,
	/// `aria-label` attribute, when present.
	#[serde(default)]
	pub label: Option<String>,
	/// Rendered `innerText`, trimmed.
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub attributes: BTreeMap<String, String>,
}
