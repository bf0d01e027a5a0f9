use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A named participant, rendered as one column. Input order fixes the
/// left-to-right placement and is never re-sorted.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub name: String,
}

/// One directional message between two endpoints, referenced by name.
/// `index` is the caller-assigned call-grouping number and is not required
/// to be monotonic with `timestamp`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub index: i64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub dest: String,
    pub label: String,
    #[serde(default)]
    pub is_response: bool,
    #[serde(default)]
    pub is_failure: bool,
    #[serde(default)]
    pub is_timeout: bool,
}

/// Free-text banner tied to the timeline but not to any endpoint pair.
/// Whether it renders as an error or a trace depends on which list it
/// arrives in.
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Aggregate input for one diagram render.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub start_time: DateTime<Utc>,
    pub endpoints: Vec<Endpoint>,
    pub communications: Vec<Communication>,
    #[serde(default)]
    pub errors: Vec<Annotation>,
    #[serde(default)]
    pub traces: Vec<Annotation>,
}

/// Render toggles. All default to off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramOptions {
    pub show_errors: bool,
    pub show_traces: bool,
    /// Timestamps as millisecond offsets from `start_time` instead of
    /// absolute date-times.
    pub timestamp_offsets: bool,
}

/// Parse a JSON trace log into [`RequestData`].
pub fn parse_request_data(source: &str) -> Result<RequestData, String> {
    serde_json::from_str(source).map_err(|e| format!("Failed to parse trace log: {}", e))
}
