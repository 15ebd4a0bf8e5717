//! Request correlation middleware.
//!
//! Every request that passes through [`correlation_id_layer`] gets a
//! [`CorrelationId`] in its extensions (taken from `X-Correlation-ID` or
//! freshly generated), runs inside an `http_request` span tagged with that id
//! and the caller's user id, and answers with the same id in the response
//! header. Completion is logged and counted in `http_requests_total`.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/announcement", get(get_announcement))
//!     .layer(correlation_id_layer());
//! ```

use axum::{extract::Request, http::HeaderValue, response::Response};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::extractors::{Caller, CorrelationId};

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Label used in request spans for callers without an identity
const ANONYMOUS: &str = "anonymous";

/// Layer installing [`CorrelationIdMiddleware`].
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Tower layer for correlation tracking.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Wraps an inner service with correlation tracking and request logging.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> CorrelationIdMiddleware<S> {
    fn request_span(req: &Request, correlation_id: CorrelationId) -> tracing::Span {
        let caller = Caller::from_headers(req.headers());
        let user_id = caller
            .identity()
            .map_or(ANONYMOUS, |identity| identity.user_id.as_str());

        tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id.0,
            method = %req.method(),
            path = %req.uri().path(),
            user_id = %user_id,
        )
    }
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = CorrelationId::from_headers(req.headers());
        req.extensions_mut().insert(correlation_id);

        let span = Self::request_span(&req, correlation_id);
        let method = req.method().to_string();
        let started = Instant::now();
        let pending = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = pending.await?;
                let status = response.status().as_u16();

                tracing::info!(
                    status,
                    latency_ms = started.elapsed().as_millis(),
                    "Request completed"
                );
                metrics::counter!(
                    "http_requests_total",
                    "method" => method,
                    "status" => status.to_string()
                )
                .increment(1);

                // A hyphenated UUID is always a valid header value
                if let Ok(value) = HeaderValue::from_str(&correlation_id.0.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
