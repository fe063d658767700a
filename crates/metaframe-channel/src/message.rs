#![forbid(unsafe_code)]

//! Wire schema for panel messages and the payload decoder.
//!
//! Embedded content posts messages whose data is either a structured object
//! or a string holding encoded JSON; both shapes appear in practice. The
//! decoder here is deliberately permissive: every field is optional, so a
//! near-miss payload still decodes and gets rejected by the explicit
//! acceptance checks in [`channel`](crate::channel) instead of surfacing as
//! a deserialization error. Payloads that are not panel messages at all
//! simply decode to `None`.

use serde::Deserialize;
use serde_json::Value;

/// Source tag every panel message must declare.
pub const MESSAGE_SOURCE: &str = "metabox";

/// Action verb for content size reports.
pub const ACTION_RESIZE: &str = "resize";

/// Deserialization target for inbound panel messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPanelMessage {
    /// Declared source tag, expected to be [`MESSAGE_SOURCE`].
    #[serde(default)]
    pub source: Option<String>,
    /// Panel location the message addresses.
    #[serde(default)]
    pub location: Option<String>,
    /// Requested action verb.
    #[serde(default)]
    pub action: Option<String>,
    /// Reported content width, present for resize actions.
    #[serde(default)]
    pub width: Option<f64>,
    /// Reported content height, present for resize actions.
    #[serde(default)]
    pub height: Option<f64>,
}

/// Decode a message payload into its declared fields.
///
/// Accepts a JSON object directly, or a JSON string whose text encodes an
/// object. Returns `None` for every other shape, including strings that do
/// not parse as JSON and fields of the wrong type.
#[must_use]
pub fn parse_payload(payload: &Value) -> Option<RawPanelMessage> {
    match payload {
        Value::Object(_) => serde_json::from_value(payload.clone()).ok(),
        Value::String(text) => {
            // Derived structs also decode from JSON arrays positionally;
            // only text that encodes an object counts.
            let decoded: Value = serde_json::from_str(text).ok()?;
            if !decoded.is_object() {
                return None;
            }
            serde_json::from_value(decoded).ok()
        }
        _ => None,
    }
}
