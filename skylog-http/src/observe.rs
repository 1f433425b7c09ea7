//! Response observation and guaranteed access-entry emission.
//!
//! [`CountingBody`] decorates the downstream response body: it forwards every
//! frame untouched while accumulating the byte count of data frames actually
//! yielded. [`Completion`] owns everything the final access entry needs and
//! emits it exactly once: when the body finishes streaming, or from `Drop`
//! on any abnormal exit path (handler panic, cancellation, inner-service
//! error), so every request produces its access entry.

use bytes::Buf;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use serde_json::{Map, Value};
use skylog_core::RequestLog;
use skylog_core::entry::{self, AccessEntry, HttpRequest};
use skylog_core::sink::LineSink;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Instant;

/// Facts about the inbound request, captured before the handler runs.
/// Missing metadata degrades to empty strings.
#[derive(Debug, Clone)]
pub(crate) struct HttpFacts {
    pub method: String,
    pub url: String,
    pub request_size: u64,
    pub user_agent: String,
    pub remote_ip: String,
    pub server_ip: String,
    pub referer: String,
    pub protocol: String,
}

/// Pending access entry for one request.
///
/// Status is recorded once, from the response head; it stays 0 when the
/// request never produced one. The byte counter only reflects frames the
/// downstream actually received.
pub(crate) struct Completion {
    log: Arc<RequestLog>,
    sink: Arc<dyn LineSink>,
    facts: HttpFacts,
    data: Map<String, Value>,
    started: Instant,
    status: AtomicU16,
    response_bytes: AtomicU64,
    finished: AtomicBool,
}

impl Completion {
    pub(crate) fn new(
        log: Arc<RequestLog>,
        sink: Arc<dyn LineSink>,
        facts: HttpFacts,
        data: Map<String, Value>,
        started: Instant,
    ) -> Self {
        Self {
            log,
            sink,
            facts,
            data,
            started,
            status: AtomicU16::new(0),
            response_bytes: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Record the response status. Only the first call takes effect.
    pub(crate) fn set_status(&self, code: u16) {
        let _ = self
            .status
            .compare_exchange(0, code, Ordering::SeqCst, Ordering::Relaxed);
    }

    pub(crate) fn add_response_bytes(&self, n: u64) {
        self.response_bytes.fetch_add(n, Ordering::Relaxed);
    }

    /// Emit the access entry. Idempotent; must not panic (it runs from `Drop`,
    /// possibly during unwind).
    pub(crate) fn finish(&self) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }

        let http_request = HttpRequest {
            request_method: self.facts.method.clone(),
            request_url: self.facts.url.clone(),
            request_size: entry::decimal_string(self.facts.request_size),
            status: self.status.load(Ordering::SeqCst),
            response_size: entry::decimal_string(self.response_bytes.load(Ordering::SeqCst)),
            user_agent: self.facts.user_agent.clone(),
            remote_ip: self.facts.remote_ip.clone(),
            server_ip: self.facts.server_ip.clone(),
            referer: self.facts.referer.clone(),
            latency: entry::latency_seconds(self.started.elapsed()),
            protocol: self.facts.protocol.clone(),
            cache_lookup: false,
            cache_hit: false,
            cache_validated_with_origin_server: false,
        };
        let access = AccessEntry::new(
            self.log.trace(),
            self.log.max_severity(),
            http_request,
            &self.data,
        );
        match serde_json::to_string(&access) {
            Ok(line) => {
                if let Err(e) = self.sink.append(&line) {
                    tracing::error!(error = %e, "failed to append access log line");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize access log line"),
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.finish();
    }
}

pin_project! {
    /// Response-body decorator: counts forwarded bytes without altering them
    /// and triggers the access entry when the stream ends.
    pub struct CountingBody<B> {
        #[pin]
        inner: B,
        completion: Arc<Completion>,
    }
}

impl<B> CountingBody<B> {
    pub(crate) fn new(inner: B, completion: Arc<Completion>) -> Self {
        Self { inner, completion }
    }
}

impl<B> Body for CountingBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        match this.inner.poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.completion.add_response_bytes(data.remaining() as u64);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => {
                this.completion.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
