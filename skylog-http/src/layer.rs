//! Request-logging middleware.
//!
//! [`RequestLogLayer`] wraps any `tower::Service` handling `http` requests.
//! Per request it resolves the trace identifier, attaches a
//! [`RequestLog`] to the request extensions for handlers to log through,
//! and, once the response body has been delivered, emits the single access
//! entry carrying the HTTP transaction facts and the maximum severity the
//! handler logged.

use crate::observe::{Completion, CountingBody, HttpFacts};
use axum::extract::ConnectInfo;
use futures::future::BoxFuture;
use http::{Request, Response};
use serde_json::{Map, Value};
use skylog_core::sink::LineSink;
use skylog_core::trace::{resolve_trace_id, trace_resource};
use skylog_core::{LogConfig, LogError, RequestLog, Severity};
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Retrieve the current request's logging context.
///
/// Returns `None` when [`RequestLogLayer`] was not applied; callers must
/// treat that as "logging disabled", never as an error. Inside axum handlers
/// the same context is available as `Extension<Arc<RequestLog>>`.
pub fn request_log<B>(req: &Request<B>) -> Option<Arc<RequestLog>> {
    req.extensions().get::<Arc<RequestLog>>().cloned()
}

// ── Layer ────────────────────────────────────────────────────────────────────

/// Tower layer producing [`RequestLogService`].
#[derive(Clone)]
pub struct RequestLogLayer {
    shared: Arc<Shared>,
}

struct Shared {
    project_id: String,
    threshold: Severity,
    app_sink: Arc<dyn LineSink>,
    request_sink: Arc<dyn LineSink>,
    data: Map<String, Value>,
    server_ip: String,
}

impl RequestLogLayer {
    /// Build the layer, constructing both sinks from the configuration.
    pub fn new(config: LogConfig) -> Result<Self, LogError> {
        let app_sink = config.app_log.build()?;
        let request_sink = config.request_log.build()?;
        Ok(Self::with_sinks(config, app_sink, request_sink))
    }

    /// Build the layer with caller-provided sinks (custom destinations,
    /// in-memory capture in tests). The configured sink targets are ignored.
    pub fn with_sinks(
        config: LogConfig,
        app_sink: Arc<dyn LineSink>,
        request_sink: Arc<dyn LineSink>,
    ) -> Self {
        let server_ip = config
            .server_ip
            .clone()
            .or_else(detect_server_ip)
            .unwrap_or_default();
        Self {
            shared: Arc::new(Shared {
                project_id: config.project_id,
                threshold: config.threshold,
                app_sink,
                request_sink,
                data: config.data,
                server_ip,
            }),
        }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            shared: Arc::clone(&self.shared),
        }
    }
}

// ── Service ──────────────────────────────────────────────────────────────────

/// The middleware service. One [`RequestLog`] and one pending access entry
/// are created per call; the access entry is emitted on every exit path.
#[derive(Clone)]
pub struct RequestLogService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: http_body::Body + Send + 'static,
{
    type Response = Response<CountingBody<ResBody>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        // take the service that was driven to readiness, leave the clone
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let shared = Arc::clone(&self.shared);

        Box::pin(async move {
            let started = Instant::now();
            let trace_id = resolve_trace_id(req.headers());
            let trace = trace_resource(&shared.project_id, &trace_id);

            let log = Arc::new(RequestLog::new(
                trace,
                shared.threshold,
                Arc::clone(&shared.app_sink),
                shared.data.clone(),
            ));
            let facts = snapshot_facts(&req, shared.server_ip.clone());
            req.extensions_mut().insert(Arc::clone(&log));

            // Dropping this guard emits the access entry, so it fires even
            // when the inner call errors, panics, or is cancelled.
            let completion = Arc::new(Completion::new(
                log,
                Arc::clone(&shared.request_sink),
                facts,
                shared.data.clone(),
                started,
            ));

            let response = inner.call(req).await?;
            completion.set_status(response.status().as_u16());
            Ok(response.map(|body| CountingBody::new(body, completion)))
        })
    }
}

// ── Request facts ────────────────────────────────────────────────────────────

fn snapshot_facts<B>(req: &Request<B>, server_ip: String) -> HttpFacts {
    HttpFacts {
        method: req.method().to_string(),
        url: req.uri().to_string(),
        request_size: req
            .headers()
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        user_agent: header_str(req, http::header::USER_AGENT),
        remote_ip: remote_ip(req),
        server_ip,
        referer: header_str(req, http::header::REFERER),
        protocol: format!("{:?}", req.version()),
    }
}

fn header_str<B>(req: &Request<B>, name: http::header::HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Best-effort client address: forwarded-for chain first, then the peer
/// address the host recorded. Empty when nothing is available.
fn remote_ip<B>(req: &Request<B>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }
    if let Some(real_ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return real_ip.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// Local address of the default outbound route. The connect call only
/// selects an interface; no datagram is sent.
fn detect_server_ip() -> Option<String> {
    let socket = std::net::UdpSocket::bind(("0.0.0.0", 0)).ok()?;
    socket.connect(("8.8.8.8", 80)).ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<()> {
        Request::builder()
            .method("POST")
            .uri("/v1/items?page=2")
            .header("content-length", "128")
            .header("user-agent", "curl/8.0")
            .header("referer", "https://example.com/")
            .body(())
            .unwrap()
    }

    #[test]
    fn snapshot_captures_request_metadata() {
        let facts = snapshot_facts(&request(), "10.0.0.1".into());
        assert_eq!(facts.method, "POST");
        assert_eq!(facts.url, "/v1/items?page=2");
        assert_eq!(facts.request_size, 128);
        assert_eq!(facts.user_agent, "curl/8.0");
        assert_eq!(facts.referer, "https://example.com/");
        assert_eq!(facts.server_ip, "10.0.0.1");
        assert_eq!(facts.protocol, "HTTP/1.1");
    }

    #[test]
    fn missing_metadata_degrades_to_empty_and_zero() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let facts = snapshot_facts(&req, String::new());
        assert_eq!(facts.request_size, 0);
        assert!(facts.user_agent.is_empty());
        assert!(facts.referer.is_empty());
        assert!(facts.remote_ip.is_empty());
    }

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let req = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.2")
            .header("x-real-ip", "10.0.0.3")
            .body(())
            .unwrap();
        assert_eq!(remote_ip(&req), "203.0.113.7");
    }

    #[test]
    fn real_ip_backs_up_forwarded_for() {
        let req = Request::builder()
            .uri("/")
            .header("x-real-ip", "10.0.0.3")
            .body(())
            .unwrap();
        assert_eq!(remote_ip(&req), "10.0.0.3");
    }

    #[test]
    fn connect_info_backs_up_headers() {
        let mut req = Request::builder().uri("/").body(()).unwrap();
        let addr: SocketAddr = "192.0.2.4:50123".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(remote_ip(&req), "192.0.2.4");
    }

    #[test]
    fn accessor_is_none_without_the_layer() {
        let req = Request::builder().uri("/").body(()).unwrap();
        assert!(request_log(&req).is_none());
    }
}
