use thiserror::Error;

/// Errors surfaced by configuration and sink construction.
///
/// Emission-path failures (serialization, sink writes) are intentionally not
/// represented here as return values to handler code: logging must never
/// alter the outcome of the request being served, so those are reported on
/// the diagnostic channel and swallowed.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink I/O error: {0}")]
    Sink(#[from] std::io::Error),
}
