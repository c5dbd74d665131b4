/*
 * Responsibility
 * - Fallback handler: hand requests that passed the pipeline to the upstream
 * - Upstream failure → 502
 */
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};

use crate::{
    error::AppError,
    middleware::exchange::{client_ip, read_body},
    services::upstream::ForwardRequest,
    state::AppState,
};

pub async fn forward(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    let client_ip = client_ip(req.extensions());
    let (parts, body) = req.into_parts();

    let body = read_body(body).await?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let request = ForwardRequest {
        method: parts.method,
        path_and_query,
        headers: parts.headers,
        body,
        client_ip,
    };

    state.upstream.forward(request).await.map_err(|err| {
        tracing::warn!(error = %err, "upstream request failed");
        AppError::BadGateway
    })
}
