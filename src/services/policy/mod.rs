//! Request policy engine: decides allow/reject before any auth work happens.
//!
//! Checks run in a fixed order and each one is independently toggleable:
//! 1. OPTIONS always passes (CORS preflight)
//! 2. HTTPS enforcement
//! 3. Host allowlist (with optional private/loopback exception)
//! 4. Method + path allowlist (404 on miss, so path existence is not leaked)
//! 5. JSON content type for POST/PUT/PATCH
//!
//! The engine only reads method / uri / headers; it never touches the body.

pub mod pattern;
pub mod rules;

use std::collections::HashSet;
use std::net::IpAddr;

use axum::http::{HeaderMap, Method, Uri, header, uri::Scheme};
use thiserror::Error;

use crate::error::AppError;

use rules::{ALLOW_RULES, AllowRule, JSON_CONTENT_TYPE_EXEMPTIONS};

/// Policy toggles. Kept separate from `Config` so the engine is testable on its own.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub enforce_https: bool,
    // lower-cased; empty disables the host check
    pub allowed_hosts: HashSet<String>,
    pub allow_private_ip_host: bool,
    pub enforce_method_path_allowlist: bool,
    pub enforce_json_content_type: bool,
    pub prevalidate_refresh_token_type: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enforce_https: false,
            allowed_hosts: HashSet::new(),
            allow_private_ip_host: true,
            enforce_method_path_allowlist: true,
            enforce_json_content_type: true,
            prevalidate_refresh_token_type: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error("https required")]
    HttpsRequired,
    #[error("host not allowed")]
    HostNotAllowed,
    #[error("no allow rule matched")]
    NoMatchingRule,
    #[error("json content type required")]
    NonJsonContentType,
}

impl From<PolicyRejection> for AppError {
    fn from(r: PolicyRejection) -> Self {
        match r {
            PolicyRejection::HttpsRequired | PolicyRejection::HostNotAllowed => AppError::Forbidden,
            PolicyRejection::NoMatchingRule => AppError::NotFound,
            PolicyRejection::NonJsonContentType => AppError::UnsupportedMediaType,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyEngine {
    config: PolicyConfig,
    rules: &'static [AllowRule],
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            rules: ALLOW_RULES.as_slice(),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Result<(), PolicyRejection> {
        if method == Method::OPTIONS {
            return Ok(());
        }

        if self.config.enforce_https && !is_https(uri, headers) {
            return Err(PolicyRejection::HttpsRequired);
        }

        if !self.config.allowed_hosts.is_empty() {
            let host = request_host(uri, headers).unwrap_or_default();
            let allowed = self.config.allowed_hosts.contains(&host)
                || (self.config.allow_private_ip_host && is_private_ip_host(&host));
            if host.is_empty() || !allowed {
                return Err(PolicyRejection::HostNotAllowed);
            }
        }

        let path = uri.path();

        if self.config.enforce_method_path_allowlist
            && !self.rules.iter().any(|rule| rule.matches(method, path))
        {
            return Err(PolicyRejection::NoMatchingRule);
        }

        if self.config.enforce_json_content_type
            && requires_json_content_type(method)
            && !is_json_request(path, headers)
        {
            return Err(PolicyRejection::NonJsonContentType);
        }

        Ok(())
    }
}

fn is_https(uri: &Uri, headers: &HeaderMap) -> bool {
    if uri.scheme() == Some(&Scheme::HTTPS) {
        return true;
    }
    // first hop wins when a proxy chain appended values
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Host header (or authority for HTTP/2) without port, lower-cased.
fn request_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))?
        .trim();

    let host = if let Some(bracketed) = raw.strip_prefix('[') {
        // [v6]:port
        bracketed.split(']').next().unwrap_or_default()
    } else if raw.matches(':').count() == 1 {
        raw.split(':').next().unwrap_or_default()
    } else {
        raw
    };

    Some(host.to_ascii_lowercase())
}

/// Literal addresses only; hostnames are not resolved on the request path.
fn is_private_ip_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback(),
        // loopback or unique-local fc00::/7
        Ok(IpAddr::V6(v6)) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
        Err(_) => false,
    }
}

fn requires_json_content_type(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn is_json_request(path: &str, headers: &HeaderMap) -> bool {
    if JSON_CONTENT_TYPE_EXEMPTIONS.iter().any(|p| p.matches(path)) {
        return true;
    }

    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match media_type.split_once('/') {
        Some(("application", "json")) => true,
        Some((_, subtype)) => subtype.ends_with("+json"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn engine() -> PolicyEngine {
        PolicyEngine::new(PolicyConfig::default())
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn uri(s: &'static str) -> Uri {
        Uri::from_static(s)
    }

    #[test]
    fn options_always_passes() {
        let mut config = PolicyConfig::default();
        config.enforce_https = true;
        let engine = PolicyEngine::new(config);

        let res = engine.evaluate(&Method::OPTIONS, &uri("/nowhere"), &HeaderMap::new());
        assert!(res.is_ok());
    }

    #[test]
    fn unknown_method_path_is_404_even_if_path_exists_under_other_method() {
        let engine = engine();
        // GET /v1/auth/login is not allowed, POST is
        let res = engine.evaluate(&Method::GET, &uri("/v1/auth/login"), &HeaderMap::new());
        assert_eq!(res, Err(PolicyRejection::NoMatchingRule));
        assert!(matches!(AppError::from(res.unwrap_err()), AppError::NotFound));

        let res = engine.evaluate(&Method::GET, &uri("/v9/unknown"), &HeaderMap::new());
        assert_eq!(res, Err(PolicyRejection::NoMatchingRule));
    }

    #[test]
    fn get_is_exempt_from_content_type_enforcement() {
        let res = engine().evaluate(&Method::GET, &uri("/v1/posts"), &HeaderMap::new());
        assert!(res.is_ok());
    }

    #[test]
    fn post_requires_json_content_type() {
        let engine = engine();
        let res = engine.evaluate(&Method::POST, &uri("/v1/posts"), &HeaderMap::new());
        assert_eq!(res, Err(PolicyRejection::NonJsonContentType));

        let res = engine.evaluate(
            &Method::POST,
            &uri("/v1/posts"),
            &headers(&[("content-type", "text/plain")]),
        );
        assert_eq!(res, Err(PolicyRejection::NonJsonContentType));

        let res = engine.evaluate(
            &Method::POST,
            &uri("/v1/posts"),
            &headers(&[("content-type", "application/json; charset=utf-8")]),
        );
        assert!(res.is_ok());

        let res = engine.evaluate(
            &Method::POST,
            &uri("/v1/posts"),
            &headers(&[("content-type", "application/merge-patch+json")]),
        );
        assert!(res.is_ok());
    }

    #[test]
    fn upload_endpoints_are_exempt_from_json_enforcement() {
        let res = engine().evaluate(
            &Method::POST,
            &uri("/v1/images"),
            &headers(&[("content-type", "multipart/form-data; boundary=x")]),
        );
        assert!(res.is_ok());
    }

    #[test]
    fn https_enforcement_trusts_forwarded_proto() {
        let mut config = PolicyConfig::default();
        config.enforce_https = true;
        let engine = PolicyEngine::new(config);

        let res = engine.evaluate(&Method::GET, &uri("/v1/posts"), &HeaderMap::new());
        assert_eq!(res, Err(PolicyRejection::HttpsRequired));

        let res = engine.evaluate(
            &Method::GET,
            &uri("/v1/posts"),
            &headers(&[("x-forwarded-proto", "HTTPS")]),
        );
        assert!(res.is_ok());
    }

    #[test]
    fn host_allowlist_is_case_insensitive_and_ignores_port() {
        let mut config = PolicyConfig::default();
        config.allowed_hosts.insert("api.example.com".into());
        config.allow_private_ip_host = false;
        let engine = PolicyEngine::new(config);

        let res = engine.evaluate(
            &Method::GET,
            &uri("/v1/posts"),
            &headers(&[("host", "API.Example.com:8443")]),
        );
        assert!(res.is_ok());

        let res = engine.evaluate(
            &Method::GET,
            &uri("/v1/posts"),
            &headers(&[("host", "evil.example.com")]),
        );
        assert_eq!(res, Err(PolicyRejection::HostNotAllowed));

        let res = engine.evaluate(&Method::GET, &uri("/v1/posts"), &HeaderMap::new());
        assert_eq!(res, Err(PolicyRejection::HostNotAllowed));
    }

    #[test]
    fn private_ip_hosts_pass_only_when_enabled() {
        let mut config = PolicyConfig::default();
        config.allowed_hosts.insert("api.example.com".into());
        let engine = PolicyEngine::new(config.clone());

        for host in ["10.0.0.5:8080", "127.0.0.1", "192.168.1.1", "[::1]:3000", "localhost"] {
            let mut map = HeaderMap::new();
            map.insert(header::HOST, HeaderValue::from_str(host).unwrap());
            assert!(
                engine.evaluate(&Method::GET, &uri("/v1/posts"), &map).is_ok(),
                "{host} should be allowed"
            );
        }

        let res = engine.evaluate(
            &Method::GET,
            &uri("/v1/posts"),
            &headers(&[("host", "8.8.8.8")]),
        );
        assert_eq!(res, Err(PolicyRejection::HostNotAllowed));

        config.allow_private_ip_host = false;
        let engine = PolicyEngine::new(config);
        let res = engine.evaluate(
            &Method::GET,
            &uri("/v1/posts"),
            &headers(&[("host", "10.0.0.5")]),
        );
        assert_eq!(res, Err(PolicyRejection::HostNotAllowed));
    }

    #[test]
    fn allowlist_can_be_disabled() {
        let mut config = PolicyConfig::default();
        config.enforce_method_path_allowlist = false;
        let engine = PolicyEngine::new(config);

        let res = engine.evaluate(&Method::GET, &uri("/v9/unknown"), &HeaderMap::new());
        assert!(res.is_ok());
    }

    #[test]
    fn path_variables_in_rules() {
        let engine = engine();
        let res = engine.evaluate(&Method::DELETE, &uri("/v1/posts/123"), &HeaderMap::new());
        assert!(res.is_ok());
        let res = engine.evaluate(&Method::DELETE, &uri("/v1/posts"), &HeaderMap::new());
        assert_eq!(res, Err(PolicyRejection::NoMatchingRule));
    }
}
