use axum::http::HeaderValue;

use crate::headers;
use crate::middleware::exchange::Exchange;
use crate::state::AppState;

/// Attaches the cached (or freshly built) identity payload for the backend.
pub async fn attach(state: &AppState, mut exchange: Exchange) -> Exchange {
    let request_headers = exchange.headers_mut();
    request_headers.remove(headers::AUTH_CONTEXT);
    request_headers.remove(headers::AUTH_CONTEXT_CACHE);

    let Some(principal) = exchange.principal.as_ref() else {
        return exchange;
    };

    let resolution = state.auth_context.resolve(principal).await;

    // non-ASCII claim values are valid obs-text
    match HeaderValue::from_bytes(resolution.payload.as_bytes()) {
        Ok(payload) => {
            let request_headers = exchange.headers_mut();
            request_headers.insert(headers::AUTH_CONTEXT, payload);
            request_headers.insert(
                headers::AUTH_CONTEXT_CACHE,
                HeaderValue::from_static(resolution.cache_status()),
            );
        }
        Err(err) => tracing::warn!(error = %err, "auth context payload is not a valid header value"),
    }

    exchange
}
