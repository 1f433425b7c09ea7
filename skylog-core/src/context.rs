//! Request-scoped logging context.
//!
//! One [`RequestLog`] exists per in-flight HTTP request. Handlers log through
//! it at any severity; every accepted statement is written to the application
//! sink immediately and its severity is remembered so the request's access
//! entry can report the maximum severity observed.
//!
//! Logging never fails the caller: serialization and sink errors are reported
//! on the diagnostic channel (`tracing`) and swallowed.

use crate::entry::{self, AppEntry, SourceLocation};
use crate::severity::Severity;
use crate::sink::LineSink;
use serde_json::{Map, Value};
use std::panic::Location;
use std::sync::{Arc, Mutex};

/// Logging state for exactly one HTTP request.
///
/// Created by the middleware before the handler runs, shared with the handler
/// through request extensions, read once at completion for
/// [`max_severity`](RequestLog::max_severity), then discarded. Safe to log to
/// from concurrent request-scoped tasks.
pub struct RequestLog {
    trace: String,
    threshold: Severity,
    sink: Arc<dyn LineSink>,
    data: Map<String, Value>,
    history: Mutex<Vec<Severity>>,
}

impl RequestLog {
    /// `trace` is the full trace resource name
    /// (`projects/<project>/traces/<trace-id>`). Statements below `threshold`
    /// are dropped without side effects.
    pub fn new(
        trace: String,
        threshold: Severity,
        sink: Arc<dyn LineSink>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            trace,
            threshold,
            sink,
            data,
            history: Mutex::new(Vec::new()),
        }
    }

    /// The trace resource name every entry of this request carries.
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// Log a message at an explicit severity (the only way to log `DEFAULT`).
    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl AsRef<str>) {
        self.write(severity, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.write(Severity::Debug, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.write(Severity::Info, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn notice(&self, message: impl AsRef<str>) {
        self.write(Severity::Notice, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.write(Severity::Warning, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.write(Severity::Error, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.write(Severity::Critical, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn alert(&self, message: impl AsRef<str>) {
        self.write(Severity::Alert, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn emergency(&self, message: impl AsRef<str>) {
        self.write(Severity::Emergency, message.as_ref(), Location::caller());
    }

    /// Highest severity accepted so far, or `DEFAULT` when nothing was logged.
    pub fn max_severity(&self) -> Severity {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .max()
            .unwrap_or(Severity::Default)
    }

    fn write(&self, severity: Severity, message: &str, location: &'static Location<'static>) {
        if severity < self.threshold {
            return;
        }

        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(severity);

        let app_entry = AppEntry {
            time: entry::timestamp(),
            trace: &self.trace,
            source_location: SourceLocation::from_caller(location),
            severity: severity.name(),
            message,
            data: &self.data,
        };
        match serde_json::to_string(&app_entry) {
            Ok(line) => {
                if let Err(e) = self.sink.append(&line) {
                    tracing::error!(error = %e, "failed to append application log line");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize application log line"),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
