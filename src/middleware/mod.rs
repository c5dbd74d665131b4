/*
 * Responsibility
 * - Public interface of the middleware layer
 * - pipeline::apply (security stages), http::apply / cors::apply (tower layers)
 */
pub mod auth;
pub mod auth_context;
pub mod auth_request;
pub mod cors;
pub mod exchange;
pub mod http;
pub mod pipeline;
pub mod policy;
pub mod principal_headers;
pub mod rate_limit;
