use crate::error::AppError;
use crate::middleware::exchange::Exchange;
use crate::state::AppState;

/// Allowlist / host / scheme / content-type gate; runs before any auth work.
pub async fn enforce(state: &AppState, exchange: Exchange) -> Result<Exchange, AppError> {
    let parts = exchange.parts();
    if let Err(rejection) = state
        .policy
        .evaluate(&parts.method, &parts.uri, &parts.headers)
    {
        tracing::warn!(
            method = %parts.method,
            path = %parts.uri.path(),
            reason = %rejection,
            "request rejected by policy"
        );
        return Err(rejection.into());
    }
    Ok(exchange)
}
