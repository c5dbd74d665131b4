/*
 * Responsibility
 * - URL structure of the gateway's own v1 endpoints (nested under /internal/v1)
 * - Everything else falls through to the upstream
 */
use axum::{Router, routing::post};

use crate::api::v1::handlers::cache::invalidate;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/cache/invalidation", post(invalidate))
}
