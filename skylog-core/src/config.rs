//! Logging configuration.
//!
//! An explicitly constructed value passed to the middleware; there is no
//! process-wide logging singleton. [`LogConfig::new`] gives the documented
//! defaults; [`LogConfig::load`] merges a YAML file with `SKYLOG_*`
//! environment variables.

use crate::error::LogError;
use crate::severity::Severity;
use crate::sink::{FileSink, LineSink, StderrSink, StdoutSink};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for the request-logging middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Project identifier used to build the trace resource name.
    pub project_id: String,

    /// Statements below this severity are dropped. Default: INFO.
    #[serde(default = "default_threshold")]
    pub threshold: Severity,

    /// Destination for the per-request access entries.
    #[serde(default = "default_request_log")]
    pub request_log: SinkTarget,

    /// Destination for application entries logged during handling.
    #[serde(default = "default_app_log")]
    pub app_log: SinkTarget,

    /// Static fields merged into every emitted line as `data`.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Reported as `serverIp` in access entries. Detected at middleware
    /// construction when unset; empty when detection fails.
    #[serde(default)]
    pub server_ip: Option<String>,
}

/// Where a line sink writes. The two log kinds default to different standard
/// streams so the host can route them independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkTarget {
    Stdout,
    Stderr,
    File { path: PathBuf },
}

impl SinkTarget {
    /// Construct the sink for this target.
    pub fn build(&self) -> Result<Arc<dyn LineSink>, LogError> {
        Ok(match self {
            SinkTarget::Stdout => Arc::new(StdoutSink),
            SinkTarget::Stderr => Arc::new(StderrSink),
            SinkTarget::File { path } => Arc::new(FileSink::new(path.clone())?),
        })
    }
}

// ── Defaults ──────────────────────────────────────────────────

fn default_threshold() -> Severity {
    Severity::Info
}
fn default_request_log() -> SinkTarget {
    SinkTarget::Stderr
}
fn default_app_log() -> SinkTarget {
    SinkTarget::Stdout
}

// ── Impls ─────────────────────────────────────────────────────

impl LogConfig {
    /// Default configuration: INFO threshold, access entries to stderr,
    /// application entries to stdout, no static fields.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            threshold: default_threshold(),
            request_log: default_request_log(),
            app_log: default_app_log(),
            data: Map::new(),
            server_ip: None,
        }
    }

    /// Load from a YAML file, overridden by `SKYLOG_*` environment variables
    /// (e.g. `SKYLOG_THRESHOLD=warning`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogError> {
        Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("SKYLOG_"))
            .extract()
            .map_err(|e| LogError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_documented_defaults() {
        let config = LogConfig::new("my-project");
        assert_eq!(config.project_id, "my-project");
        assert_eq!(config.threshold, Severity::Info);
        assert_eq!(config.request_log, SinkTarget::Stderr);
        assert_eq!(config.app_log, SinkTarget::Stdout);
        assert!(config.data.is_empty());
        assert!(config.server_ip.is_none());
    }

    #[test]
    fn deserializes_with_defaults_from_minimal_yaml() {
        let config: LogConfig = serde_json::from_value(serde_json::json!({
            "project_id": "p"
        }))
        .unwrap();
        assert_eq!(config.threshold, Severity::Info);
        assert_eq!(config.request_log, SinkTarget::Stderr);
    }

    #[test]
    fn deserializes_explicit_targets_and_threshold() {
        let config: LogConfig = serde_json::from_value(serde_json::json!({
            "project_id": "p",
            "threshold": "warning",
            "app_log": "stderr",
            "request_log": { "file": { "path": "/tmp/skylog-access.log" } },
            "data": { "service": "api" }
        }))
        .unwrap();
        assert_eq!(config.threshold, Severity::Warning);
        assert_eq!(config.app_log, SinkTarget::Stderr);
        assert_eq!(
            config.request_log,
            SinkTarget::File { path: PathBuf::from("/tmp/skylog-access.log") }
        );
        assert_eq!(config.data["service"], "api");
    }

    #[test]
    fn missing_project_id_is_rejected() {
        let result: Result<LogConfig, _> = serde_json::from_value(serde_json::json!({
            "threshold": "info"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn std_targets_build() {
        assert!(SinkTarget::Stdout.build().is_ok());
        assert!(SinkTarget::Stderr.build().is_ok());
    }
}
