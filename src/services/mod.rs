pub mod auth;
pub mod auth_context;
pub mod cache;
pub mod policy;
pub mod rate_limit;
pub mod upstream;
