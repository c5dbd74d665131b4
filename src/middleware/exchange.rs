//! Per-request context threaded through the pipeline stages.
//!
//! Every stage takes the `Exchange` by value and hands back the (possibly
//! modified) one, or an `AppError` that short-circuits the chain.
use std::net::{IpAddr, SocketAddr};

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, Method, Request, request::Parts},
};
use http_body_util::LengthLimitError;

use crate::error::AppError;
use crate::services::auth::Principal;

enum ReplayableBody {
    Streaming(Body),
    Buffered(Bytes),
}

pub struct Exchange {
    parts: Parts,
    body: ReplayableBody,
    pub principal: Option<Principal>,
}

impl Exchange {
    pub fn new(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body: ReplayableBody::Streaming(body),
            principal: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        client_ip(&self.parts.extensions)
    }

    /// Reads the body once; later calls (and the backend) see the same bytes.
    pub async fn buffered_body(&mut self) -> Result<Bytes, AppError> {
        let body = match std::mem::replace(&mut self.body, ReplayableBody::Buffered(Bytes::new())) {
            ReplayableBody::Buffered(bytes) => bytes,
            ReplayableBody::Streaming(body) => read_body(body).await?,
        };
        self.body = ReplayableBody::Buffered(body.clone());
        Ok(body)
    }

    pub fn into_request(self) -> Request<Body> {
        let body = match self.body {
            ReplayableBody::Streaming(body) => body,
            ReplayableBody::Buffered(bytes) => Body::from(bytes),
        };
        let mut request = Request::from_parts(self.parts, body);
        if let Some(principal) = self.principal {
            request.extensions_mut().insert(principal);
        }
        request
    }
}

/// Collects a request body; the size bound comes from RequestBodyLimitLayer.
pub async fn read_body(body: Body) -> Result<Bytes, AppError> {
    axum::body::to_bytes(body, usize::MAX).await.map_err(|err| {
        if is_length_limit(&err) {
            AppError::PayloadTooLarge
        } else {
            tracing::warn!(error = %err, "failed to read request body");
            AppError::bad_request("INVALID_BODY", "request body could not be read")
        }
    })
}

/// Peer address from `into_make_service_with_connect_info`; absent in tests.
pub fn client_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_is_replayed_after_buffering() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/auth/login")
            .body(Body::from("{\"username\":\"a\"}"))
            .unwrap();
        let mut exchange = Exchange::new(request);

        let first = exchange.buffered_body().await.unwrap();
        let second = exchange.buffered_body().await.unwrap();
        assert_eq!(first, second);

        let request = exchange.into_request();
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, first);
    }

    #[tokio::test]
    async fn principal_travels_in_extensions() {
        let request = Request::builder().uri("/v1/me").body(Body::empty()).unwrap();
        let mut exchange = Exchange::new(request);
        exchange.principal = Some(Principal::new("s", crate::services::auth::Role::User));

        let request = exchange.into_request();
        assert_eq!(request.extensions().get::<Principal>().unwrap().subject, "s");
    }
}
