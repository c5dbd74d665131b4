//! CORS policy for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native mobile apps and server-to-server calls are not
//!   restricted by CORS.
//! - Applied as the outermost layer so rejections from the pipeline are stamped too.
//!
//! Policy:
//! - Origins: configured patterns, `*` matches any run of characters (default `https://*`).
//! - Request headers are mirrored; `X-Auth-Context-Cache` is exposed.
//! - No credentials, max-age one hour.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::headers;

/// An origin pattern such as `https://*.example.com`.
#[derive(Debug, Clone)]
pub struct OriginPattern {
    parts: Vec<String>,
}

impl OriginPattern {
    pub fn parse(raw: &str) -> Self {
        Self {
            parts: raw
                .trim()
                .to_ascii_lowercase()
                .split('*')
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn matches(&self, origin: &str) -> bool {
        let origin = origin.to_ascii_lowercase();
        let (first, rest) = match self.parts.split_first() {
            Some(split) => split,
            None => return false,
        };
        // no wildcard: exact match
        if rest.is_empty() {
            return origin == *first;
        }
        let Some(mut remaining) = origin.strip_prefix(first.as_str()) else {
            return false;
        };
        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => return false,
        };
        for part in middle {
            match remaining.find(part.as_str()) {
                Some(idx) => remaining = &remaining[idx + part.len()..],
                None => return false,
            }
        }
        remaining.ends_with(last.as_str())
    }
}

pub fn layer(patterns: &[String]) -> CorsLayer {
    let patterns: Vec<OriginPattern> = patterns.iter().map(|p| OriginPattern::parse(p)).collect();

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
        origin
            .to_str()
            .map(|origin| patterns.iter().any(|p| p.matches(origin)))
            .unwrap_or(false)
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([headers::AUTH_CONTEXT_CACHE])
        .allow_credentials(false)
        .max_age(Duration::from_secs(60 * 60))
}

/// Apply CORS policy to the given Router.
pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(&config.cors_allowed_origin_patterns))
}

#[cfg(test)]
mod tests {
    use super::OriginPattern;

    #[test]
    fn wildcard_patterns() {
        let any_https = OriginPattern::parse("https://*");
        assert!(any_https.matches("https://app.example.com"));
        assert!(!any_https.matches("http://app.example.com"));

        let sub = OriginPattern::parse("https://*.example.com");
        assert!(sub.matches("https://app.example.com"));
        assert!(sub.matches("HTTPS://A.B.Example.com"));
        assert!(!sub.matches("https://example.org"));
        assert!(!sub.matches("https://app.example.com.evil.io"));

        let exact = OriginPattern::parse("http://localhost:5173");
        assert!(exact.matches("http://localhost:5173"));
        assert!(!exact.matches("http://localhost:5174"));
    }
}
