use crate::error::AppError;
use crate::middleware::auth_request::CredentialFields;
use crate::middleware::exchange::Exchange;
use crate::services::rate_limit::{AuthEndpoint, UNKNOWN_IP, login_key, refresh_key};
use crate::state::AppState;

/// Per (endpoint, caller) fixed-window limit on the credential endpoints.
pub async fn enforce(state: &AppState, mut exchange: Exchange) -> Result<Exchange, AppError> {
    if !state.rate_limit.enabled {
        return Ok(exchange);
    }
    let Some(endpoint) = AuthEndpoint::classify(exchange.method(), exchange.path()) else {
        return Ok(exchange);
    };

    let body = exchange.buffered_body().await?;
    let fields = CredentialFields::parse(&body);

    let ip = exchange
        .client_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string());
    let key = match endpoint {
        AuthEndpoint::Login => login_key(&ip, fields.username()),
        AuthEndpoint::Refresh | AuthEndpoint::Logout => refresh_key(&ip, fields.refresh_token()),
    };

    if !state.rate_limiter.allow(&key, endpoint.limit(&state.rate_limit)) {
        tracing::warn!(?endpoint, client_ip = %ip, "rate limit exceeded");
        return Err(AppError::RateLimited {
            retry_after_seconds: state.rate_limiter.retry_after_seconds(),
        });
    }

    Ok(exchange)
}
