//! Wire-format log entries.
//!
//! Pure data shapes serialized with serde; field names and nesting follow the
//! ingestion backend's structured-log schema, including the
//! `logging.googleapis.com/*` special keys. Size fields are strings and the
//! latency is a `"<seconds>s"` literal because the backend parses them as
//! text, not as JSON numbers.

use crate::severity::Severity;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::panic::Location;
use std::time::Duration;

/// RFC 3339 timestamp with nanosecond precision, UTC.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Render an integer as its decimal string.
pub fn decimal_string(n: u64) -> String {
    itoa::Buffer::new().format(n).to_string()
}

/// `"<seconds>s"` with microsecond resolution, e.g. `"0.004210s"`.
pub fn latency_seconds(elapsed: Duration) -> String {
    format!("{:.6}s", elapsed.as_secs_f64())
}

fn skip_data(data: &&Map<String, Value>) -> bool {
    data.is_empty()
}

// ── Application entries ──────────────────────────────────────────────────────

/// Call-site of an application log statement. Best-effort: fields that could
/// not be resolved are empty strings, never errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: String,
    pub function: String,
}

impl SourceLocation {
    /// Resolve from a compiler-tracked caller location. The file is reduced
    /// to its short name; function names are not recoverable this way and
    /// stay empty.
    pub fn from_caller(location: &'static Location<'static>) -> Self {
        let file = location
            .file()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            file,
            line: location.line().to_string(),
            function: String::new(),
        }
    }
}

/// One application log statement, serialized to a single JSON line.
#[derive(Debug, Serialize)]
pub struct AppEntry<'a> {
    pub time: String,
    #[serde(rename = "logging.googleapis.com/trace")]
    pub trace: &'a str,
    #[serde(rename = "logging.googleapis.com/sourceLocation")]
    pub source_location: SourceLocation,
    pub severity: &'static str,
    pub message: &'a str,
    #[serde(rename = "data", skip_serializing_if = "skip_data")]
    pub data: &'a Map<String, Value>,
}

// ── Access entries ───────────────────────────────────────────────────────────

/// The `httpRequest` block of an access entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub request_method: String,
    pub request_url: String,
    pub request_size: String,
    pub status: u16,
    pub response_size: String,
    pub user_agent: String,
    pub remote_ip: String,
    pub server_ip: String,
    pub referer: String,
    pub latency: String,
    pub protocol: String,
    pub cache_lookup: bool,
    pub cache_hit: bool,
    pub cache_validated_with_origin_server: bool,
}

/// The single per-request access entry, emitted once at completion. Its
/// severity is the maximum severity of the application entries logged during
/// the request, or `DEFAULT` when there were none.
#[derive(Debug, Serialize)]
pub struct AccessEntry<'a> {
    pub time: String,
    #[serde(rename = "logging.googleapis.com/trace")]
    pub trace: &'a str,
    pub severity: &'static str,
    #[serde(rename = "httpRequest")]
    pub http_request: HttpRequest,
    #[serde(rename = "data", skip_serializing_if = "skip_data")]
    pub data: &'a Map<String, Value>,
}

impl<'a> AccessEntry<'a> {
    pub fn new(
        trace: &'a str,
        severity: Severity,
        http_request: HttpRequest,
        data: &'a Map<String, Value>,
    ) -> Self {
        Self {
            time: timestamp(),
            trace,
            severity: severity.name(),
            http_request,
            data,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
