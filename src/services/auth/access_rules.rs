//! Route authorization table: ordered, first match wins, default authenticated.
use std::sync::LazyLock;

use axum::http::Method;

use super::principal::Principal;
use super::role::{ROLE_ADMIN, ROLE_ORGANIZER, ROLE_USER};
use crate::services::policy::pattern::PathPattern;

const ANY_ROLE: &[&str] = &[ROLE_USER, ROLE_ORGANIZER, ROLE_ADMIN];
const ORGANIZER_OR_ADMIN: &[&str] = &[ROLE_ORGANIZER, ROLE_ADMIN];
const ADMIN_ONLY: &[&str] = &[ROLE_ADMIN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AnyAuthority(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    /// no principal on a protected route (401)
    Unauthenticated,
    /// principal without a required authority (403)
    Forbidden,
}

impl Access {
    pub fn check(&self, principal: Option<&Principal>) -> Result<(), Denied> {
        match (self, principal) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(Denied::Unauthenticated),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::AnyAuthority(required), Some(p)) => {
                if required.iter().any(|a| p.has_authority(a)) {
                    Ok(())
                } else {
                    Err(Denied::Forbidden)
                }
            }
        }
    }
}

#[derive(Debug)]
struct AccessRule {
    // None matches any method
    method: Option<Method>,
    patterns: Vec<PathPattern>,
    access: Access,
}

impl AccessRule {
    fn new(method: Option<Method>, patterns: &[&'static str], access: Access) -> Self {
        Self {
            method,
            patterns: patterns.iter().map(|p| PathPattern::parse(p)).collect(),
            access,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method)
            && self.patterns.iter().any(|p| p.matches(path))
    }
}

static ACCESS_RULES: LazyLock<Vec<AccessRule>> = LazyLock::new(|| {
    use Access::*;
    let get = || Some(Method::GET);
    let post = || Some(Method::POST);
    let patch = || Some(Method::PATCH);
    let delete = || Some(Method::DELETE);

    vec![
        AccessRule::new(Some(Method::OPTIONS), &["/**"], Public),
        // public endpoints
        AccessRule::new(post(), &["/v1/auth/**"], Public),
        AccessRule::new(post(), &["/v2/auth/login", "/v2/auth/refresh", "/activate"], Public),
        AccessRule::new(post(), &["/internal/v1/cache/invalidation"], Public),
        AccessRule::new(None, &["/api/ping/**"], Public),
        AccessRule::new(None, &["/v3/api-docs/**"], Public),
        AccessRule::new(None, &["/v2/*/v3/api-docs", "/v2/*/v3/api-docs/**"], Public),
        AccessRule::new(
            None,
            &[
                "/swagger-ui.html",
                "/swagger-ui/**",
                "/v2/docs",
                "/v2/docs/**",
                "/v2/swagger-ui/index.html",
                "/v2/swagger-ui/**",
            ],
            Public,
        ),
        AccessRule::new(
            None,
            &["/actuator/health", "/actuator/health/**", "/actuator/info"],
            Public,
        ),
        // account
        AccessRule::new(get(), &["/v1/me", "/v2/auth/me"], AnyAuthority(ANY_ROLE)),
        AccessRule::new(post(), &["/v1/me"], AnyAuthority(ANY_ROLE)),
        AccessRule::new(patch(), &["/v1/me"], AnyAuthority(ANY_ROLE)),
        AccessRule::new(None, &["/v1/admin/**", "/v2/auth/admin/**"], AnyAuthority(ADMIN_ONLY)),
        AccessRule::new(
            None,
            &["/v2/post/admin/courses", "/v2/post/admin/courses/**"],
            AnyAuthority(ADMIN_ONLY),
        ),
        AccessRule::new(
            get(),
            &["/v1/courses", "/v1/courses/**", "/v2/post/courses", "/v2/post/courses/**"],
            AnyAuthority(ANY_ROLE),
        ),
        // blog; drafts must come before the public single-segment wildcard
        AccessRule::new(
            get(),
            &["/v1/posts/drafts", "/v2/post/drafts"],
            AnyAuthority(ORGANIZER_OR_ADMIN),
        ),
        AccessRule::new(get(), &["/v1/posts", "/v1/posts/*", "/v2/post", "/v2/post/*"], Public),
        AccessRule::new(post(), &["/v1/posts", "/v2/post"], AnyAuthority(ORGANIZER_OR_ADMIN)),
        AccessRule::new(patch(), &["/v1/posts/*", "/v2/post/*"], AnyAuthority(ORGANIZER_OR_ADMIN)),
        AccessRule::new(delete(), &["/v1/posts/*", "/v2/post/*"], AnyAuthority(ADMIN_ONLY)),
        AccessRule::new(post(), &["/v1/images", "/v2/post/images"], AnyAuthority(ORGANIZER_OR_ADMIN)),
    ]
});

pub fn required_access(method: &Method, path: &str) -> Access {
    ACCESS_RULES
        .iter()
        .find(|rule| rule.matches(method, path))
        .map(|rule| rule.access)
        .unwrap_or(Access::Authenticated)
}
