/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - policy engine, rate limiter, token verifiers, auth-context services, upstream
 * - Cheap to clone (everything inside is Arc / Copy)
 */
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{
    AccessTokenVerifier, RefreshTokenVerifier, build_access_verifier, build_refresh_verifier,
};
use crate::services::auth_context::{AuthContextService, InvalidationService};
use crate::services::cache::CacheClient;
use crate::services::policy::PolicyEngine;
use crate::services::rate_limit::{FixedWindowRateLimiter, RateLimitConfig};
use crate::services::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub auth_enabled: bool,
    pub policy: Arc<PolicyEngine>,
    pub rate_limit: RateLimitConfig,
    pub rate_limiter: Arc<FixedWindowRateLimiter>,
    pub access_verifier: Arc<AccessTokenVerifier>,
    pub refresh_verifier: Arc<RefreshTokenVerifier>,
    pub auth_context: AuthContextService,
    pub invalidation: InvalidationService,
    pub upstream: Arc<dyn Upstream>,
    pub internal_event_token: Arc<str>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // internal_event_token is a secret
        f.debug_struct("AppState")
            .field("auth_enabled", &self.auth_enabled)
            .field("policy", &self.policy)
            .field("rate_limit", &self.rate_limit)
            .field("access_verifier", &self.access_verifier)
            .field("auth_context", &self.auth_context)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(config: &Config, cache: Arc<dyn CacheClient>, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            auth_enabled: config.auth_enabled,
            policy: Arc::new(PolicyEngine::new(config.policy.clone())),
            rate_limit: config.rate_limit,
            rate_limiter: Arc::new(FixedWindowRateLimiter::new()),
            access_verifier: build_access_verifier(config),
            refresh_verifier: build_refresh_verifier(config),
            auth_context: AuthContextService::new(Arc::clone(&cache), config.auth_context),
            invalidation: InvalidationService::new(cache),
            upstream,
            internal_event_token: Arc::from(config.internal_event_token.as_str()),
        }
    }
}
