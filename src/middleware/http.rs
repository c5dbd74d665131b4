//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limits
//! - Global timeouts

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::headers;

/// Apply HTTP-level middleware to the given Router.
///
/// Limits come from `Config` (defaults: 1 MiB body, 30 s timeout).
pub fn apply(router: Router, config: &Config) -> Router {
    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(headers::REQUEST_ID, MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(headers::REQUEST_ID))
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http())
        // Bound request time (hanging upstreams / slow clients).
        .layer(TimeoutLayer::new(config.request_timeout))
        // Limit request body size; the pipeline buffers auth bodies.
        .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes));

    router.layer(layers)
}
