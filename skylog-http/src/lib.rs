//! Request-scoped structured logging middleware for tower-based HTTP
//! services.
//!
//! The layer correlates every log statement a handler emits with the
//! request's trace identifier and, when the response completes, writes one
//! access entry whose severity is the maximum severity logged during the
//! request.
//!
//! ```no_run
//! use axum::{Extension, Router, routing::get};
//! use skylog_core::{LogConfig, RequestLog};
//! use skylog_http::RequestLogLayer;
//! use std::sync::Arc;
//!
//! async fn handler(Extension(log): Extension<Arc<RequestLog>>) -> &'static str {
//!     log.info("handling");
//!     "ok"
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let layer = RequestLogLayer::new(LogConfig::new("my-project"))?;
//! let app: Router = Router::new().route("/", get(handler)).layer(layer);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod layer;
pub mod observe;

pub use layer::{RequestLogLayer, RequestLogService, request_log};
pub use observe::CountingBody;
