//! Static tables consulted by the policy engine.
use std::sync::LazyLock;

use axum::http::Method;

use super::pattern::PathPattern;

/// One permitted (method, path) combination.
#[derive(Debug, Clone)]
pub struct AllowRule {
    pub method: Method,
    pub pattern: PathPattern,
}

impl AllowRule {
    fn new(method: Method, pattern: &'static str) -> Self {
        Self {
            method,
            pattern: PathPattern::parse(pattern),
        }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == method && self.pattern.matches(path)
    }
}

pub static ALLOW_RULES: LazyLock<Vec<AllowRule>> = LazyLock::new(|| {
    use Method as M;
    vec![
        AllowRule::new(M::POST, "/v1/auth/login"),
        AllowRule::new(M::POST, "/v1/auth/refresh"),
        AllowRule::new(M::POST, "/v1/auth/logout"),
        AllowRule::new(M::POST, "/activate"),
        AllowRule::new(M::POST, "/v1/me/password"),
        AllowRule::new(M::GET, "/v1/me"),
        AllowRule::new(M::PATCH, "/v1/me"),
        AllowRule::new(M::GET, "/v1/admin/ping"),
        AllowRule::new(M::GET, "/v1/admin/users"),
        AllowRule::new(M::POST, "/v1/admin/users"),
        AllowRule::new(M::POST, "/v1/admin/users/{id}/reset-password"),
        AllowRule::new(M::DELETE, "/v1/admin/users/{id}"),
        AllowRule::new(M::GET, "/v1/posts"),
        AllowRule::new(M::GET, "/v1/posts/drafts"),
        AllowRule::new(M::POST, "/v1/posts"),
        AllowRule::new(M::GET, "/v1/posts/{postId}"),
        AllowRule::new(M::PATCH, "/v1/posts/{postId}"),
        AllowRule::new(M::DELETE, "/v1/posts/{postId}"),
        AllowRule::new(M::POST, "/v1/images"),
        AllowRule::new(M::GET, "/api/ping/**"),
        AllowRule::new(M::GET, "/v3/api-docs/**"),
        AllowRule::new(M::GET, "/swagger-ui.html"),
        AllowRule::new(M::GET, "/swagger-ui/**"),
        AllowRule::new(M::GET, "/v2/docs"),
        AllowRule::new(M::GET, "/v2/docs/**"),
        AllowRule::new(M::GET, "/v2/swagger-ui/index.html"),
        AllowRule::new(M::GET, "/v2/swagger-ui/**"),
        AllowRule::new(M::GET, "/v2/post/v3/api-docs"),
        AllowRule::new(M::GET, "/v2/post/v3/api-docs/**"),
        AllowRule::new(M::GET, "/v2/auth/v3/api-docs"),
        AllowRule::new(M::GET, "/v2/auth/v3/api-docs/**"),
        AllowRule::new(M::GET, "/actuator/health"),
        AllowRule::new(M::GET, "/actuator/health/**"),
        AllowRule::new(M::GET, "/actuator/info"),
        AllowRule::new(M::POST, "/internal/v1/cache/invalidation"),
        // legacy v2 routing
        AllowRule::new(M::POST, "/v2/auth/login"),
        AllowRule::new(M::POST, "/v2/auth/refresh"),
        AllowRule::new(M::POST, "/v2/auth/logout"),
        AllowRule::new(M::GET, "/v2/auth/me"),
        AllowRule::new(M::GET, "/v2/auth/admin/ping"),
        AllowRule::new(M::GET, "/v2/auth/admin/users"),
        AllowRule::new(M::POST, "/v2/auth/admin/users"),
        AllowRule::new(M::DELETE, "/v2/auth/admin/users/{id}"),
        AllowRule::new(M::GET, "/v2/post"),
        AllowRule::new(M::GET, "/v2/post/drafts"),
        AllowRule::new(M::POST, "/v2/post"),
        AllowRule::new(M::GET, "/v2/post/{postId}"),
        AllowRule::new(M::PATCH, "/v2/post/{postId}"),
        AllowRule::new(M::DELETE, "/v2/post/{postId}"),
        AllowRule::new(M::POST, "/v2/post/images"),
    ]
});

/// Binary upload endpoints that accept non-JSON bodies.
pub static JSON_CONTENT_TYPE_EXEMPTIONS: LazyLock<Vec<PathPattern>> = LazyLock::new(|| {
    vec![
        PathPattern::parse("/v1/images"),
        PathPattern::parse("/v2/post/images"),
        PathPattern::parse("/v2/post/images/**"),
    ]
});
