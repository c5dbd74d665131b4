/*
 * Responsibility
 * - v1 internal endpoints (routes() re-export)
 */
pub mod dto;
pub mod handlers;
mod routes;

pub use routes::routes;
