use axum::http::HeaderValue;

use crate::headers;
use crate::middleware::exchange::Exchange;

/// Never trust caller-supplied identity headers; set them from the verified
/// principal only.
pub async fn inject(mut exchange: Exchange) -> Exchange {
    let request_headers = exchange.headers_mut();
    request_headers.remove(headers::USER_ID);
    request_headers.remove(headers::ROLES);

    let Some(principal) = exchange.principal.as_ref() else {
        return exchange;
    };

    let user_id = HeaderValue::from_str(&principal.subject);
    let roles = HeaderValue::from_str(&principal.authorities_header());
    match (user_id, roles) {
        (Ok(user_id), Ok(roles)) => {
            let request_headers = exchange.headers_mut();
            request_headers.insert(headers::USER_ID, user_id);
            request_headers.insert(headers::ROLES, roles);
        }
        _ => tracing::warn!("principal is not representable as header values"),
    }

    exchange
}
