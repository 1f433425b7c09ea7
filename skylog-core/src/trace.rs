//! Trace-identifier resolution.
//!
//! Inbound requests may carry a trace context in the `X-Cloud-Trace-Context`
//! header (`TRACE_ID/SPAN_ID;o=OPTS`) or a W3C `traceparent` header
//! (`00-TRACE_ID-SPAN_ID-FLAGS`). When neither is present or the value is
//! malformed, a fresh random identifier is generated so every request still
//! gets a usable correlation id.

use http::HeaderMap;
use uuid::Uuid;

const CLOUD_TRACE_HEADER: &str = "x-cloud-trace-context";
const TRACEPARENT_HEADER: &str = "traceparent";

/// A valid trace ID is a 32-character hexadecimal string.
pub fn is_valid_trace_id(trace_id: &str) -> bool {
    trace_id.len() == 32 && trace_id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A valid span ID is a 16-character hexadecimal string.
pub fn is_valid_span_id(span_id: &str) -> bool {
    span_id.len() == 16 && span_id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolve the trace identifier for a request.
///
/// Extraction is attempted from `X-Cloud-Trace-Context` first, then
/// `traceparent`. A fresh identifier is generated otherwise; generation is
/// random rather than time-derived so concurrent requests arriving within the
/// same clock tick cannot collide. Never fails.
pub fn resolve_trace_id(headers: &HeaderMap) -> String {
    if let Some(id) = headers
        .get(CLOUD_TRACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cloud_trace_context)
    {
        return id;
    }
    if let Some(id) = headers
        .get(TRACEPARENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_traceparent)
    {
        return id;
    }
    Uuid::new_v4().simple().to_string()
}

/// Build the trace resource name the ingestion backend groups entries by.
pub fn trace_resource(project_id: &str, trace_id: &str) -> String {
    format!("projects/{project_id}/traces/{trace_id}")
}

/// `TRACE_ID/SPAN_ID;o=OPTS`. The span and options parts are optional.
fn parse_cloud_trace_context(value: &str) -> Option<String> {
    let trace_id = value.split('/').next()?;
    is_valid_trace_id(trace_id).then(|| trace_id.to_ascii_lowercase())
}

/// `VERSION-TRACE_ID-SPAN_ID-FLAGS`, all four fields required.
fn parse_traceparent(value: &str) -> Option<String> {
    let pieces: Vec<_> = value.split('-').collect();
    if pieces.len() != 4 {
        return None;
    }
    let (trace_id, span_id) = (pieces[1], pieces[2]);
    if !is_valid_trace_id(trace_id) || !is_valid_span_id(span_id) {
        return None;
    }
    Some(trace_id.to_ascii_lowercase())
}
