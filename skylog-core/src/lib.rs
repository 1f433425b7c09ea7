//! Core types for Skylog: severity, trace resolution, line sinks, wire-format
//! entries, and the per-request logging context.
//!
//! The HTTP middleware that wires these into a request/response lifecycle
//! lives in the `skylog-http` crate.

pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod severity;
pub mod sink;
pub mod trace;

pub use config::{LogConfig, SinkTarget};
pub use context::RequestLog;
pub use error::LogError;
pub use severity::Severity;
pub use sink::{BufferSink, FileSink, LineSink, StderrSink, StdoutSink};
