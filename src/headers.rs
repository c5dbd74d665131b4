//! Trusted headers the gateway sets for the backend. Client-supplied values
//! are always stripped before the gateway writes its own.
use axum::http::HeaderName;

pub const USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const ROLES: HeaderName = HeaderName::from_static("x-roles");
pub const AUTH_CONTEXT: HeaderName = HeaderName::from_static("x-auth-context");
pub const AUTH_CONTEXT_CACHE: HeaderName = HeaderName::from_static("x-auth-context-cache");

pub const INTERNAL_TOKEN: HeaderName = HeaderName::from_static("x-internal-token");
pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
