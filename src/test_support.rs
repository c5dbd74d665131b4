//! Shared fixtures for unit and router tests.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Response, StatusCode, header},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::config::{AppEnv, Config};
use crate::services::auth::JwtPolicy;
use crate::services::auth_context::AuthContextConfig;
use crate::services::cache::{CacheClient, CacheError, CacheResult, MemoryCacheClient};
use crate::services::policy::PolicyConfig;
use crate::services::rate_limit::RateLimitConfig;
use crate::services::upstream::{ForwardRequest, Upstream, UpstreamError};
use crate::state::AppState;

pub const TEST_ISSUER: &str = "https://auth.test";
pub const TEST_AUDIENCE: &str = "gateway-test";
pub const TEST_SECRET: &str = "test-secret-0123456789-abcdefghijklmnop";
pub const TEST_INTERNAL_TOKEN: &str = "internal-test-token";

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn jwt_policy() -> JwtPolicy {
    JwtPolicy {
        issuer: TEST_ISSUER.to_string(),
        audience: TEST_AUDIENCE.to_string(),
        secret: TEST_SECRET.to_string(),
        clock_skew_seconds: 30,
    }
}

pub fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        app_env: AppEnv::Development,
        upstream_base_url: url::Url::parse("http://upstream.test").unwrap(),
        cors_allowed_origin_patterns: vec!["https://*".to_string()],
        auth_enabled: true,
        jwt: jwt_policy(),
        internal_event_token: TEST_INTERNAL_TOKEN.to_string(),
        cache_url: None,
        auth_context: AuthContextConfig::default(),
        rate_limit: RateLimitConfig::default(),
        policy: PolicyConfig::default(),
        request_body_limit_bytes: 1024 * 1024,
        request_timeout: Duration::from_secs(30),
    }
}

pub fn access_claims(sub: &str, role: &str) -> Value {
    let now = now();
    json!({
        "iss": TEST_ISSUER,
        "aud": [TEST_AUDIENCE],
        "sub": sub,
        "role": role,
        "token_type": "ACCESS",
        "jti": uuid::Uuid::new_v4().to_string(),
        "iat": now,
        "exp": now + 3600,
    })
}

pub fn refresh_claims() -> Value {
    let now = now();
    json!({
        "iss": TEST_ISSUER,
        "sub": "8f14e45f-ceea-467f-a8a1-6c0b2c8b6d34",
        "token_type": "REFRESH",
        "jti": uuid::Uuid::new_v4().to_string(),
        "iat": now,
        "exp": now + 86_400,
    })
}

pub fn mint(claims: &Value) -> String {
    mint_with_secret(claims, TEST_SECRET)
}

pub fn mint_with_secret(claims: &Value, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Every call fails as if the backend were down.
#[derive(Debug, Clone, Copy)]
pub struct FailingCache;

fn down() -> CacheError {
    CacheError::BackendConnection("connection refused".into())
}

#[async_trait]
impl CacheClient for FailingCache {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn get_string(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(down())
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(down())
    }

    async fn set_add(&self, _key: &str, _member: &str) -> CacheResult<u64> {
        Err(down())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> CacheResult<bool> {
        Err(down())
    }

    async fn set_members(&self, _key: &str) -> CacheResult<Vec<String>> {
        Err(down())
    }

    async fn del_many(&self, _keys: &[String]) -> CacheResult<u64> {
        Err(down())
    }
}

/// Answers 200 with a JSON description of what it received.
#[derive(Debug, Clone, Copy)]
pub struct EchoUpstream;

#[async_trait]
impl Upstream for EchoUpstream {
    async fn forward(&self, request: ForwardRequest) -> Result<Response<Body>, UpstreamError> {
        let headers: BTreeMap<String, String> = request
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let echo = json!({
            "method": request.method.as_str(),
            "path": request.path_and_query,
            "headers": headers,
            "body": String::from_utf8_lossy(&request.body),
        });

        let mut response = Response::new(Body::from(echo.to_string()));
        *response.status_mut() = StatusCode::OK;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        Ok(response)
    }
}

pub fn test_state(config: &Config, cache: Arc<dyn CacheClient>) -> AppState {
    AppState::new(config, cache, Arc::new(EchoUpstream))
}

pub fn test_router_with(config: &Config, cache: Arc<dyn CacheClient>) -> Router {
    crate::app::build_router(test_state(config, cache), config)
}

pub fn test_router() -> Router {
    test_router_with(&test_config(), Arc::new(MemoryCacheClient::new()))
}
