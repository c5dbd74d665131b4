//! Body pre-validation for the credential endpoints.
use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::middleware::exchange::Exchange;
use crate::services::rate_limit::AuthEndpoint;
use crate::state::AppState;

/// String fields of a login / refresh / logout body. Anything unparsable or
/// non-string counts as missing.
#[derive(Debug, Default)]
pub struct CredentialFields {
    fields: Map<String, Value>,
}

impl CredentialFields {
    pub fn parse(body: &Bytes) -> Self {
        let fields = serde_json::from_slice::<Map<String, Value>>(body).unwrap_or_default();
        Self { fields }
    }

    fn non_blank(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        self.non_blank("username")
    }

    pub fn password(&self) -> Option<&str> {
        self.non_blank("password")
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.non_blank("refreshToken")
    }
}

pub async fn validate(state: &AppState, mut exchange: Exchange) -> Result<Exchange, AppError> {
    let Some(endpoint) = AuthEndpoint::classify(exchange.method(), exchange.path()) else {
        return Ok(exchange);
    };

    let body = exchange.buffered_body().await?;
    let fields = CredentialFields::parse(&body);

    match endpoint {
        AuthEndpoint::Login => {
            if fields.username().is_none() || fields.password().is_none() {
                return Err(AppError::bad_request(
                    "INVALID_LOGIN_REQUEST",
                    "username and password are required",
                ));
            }
        }
        AuthEndpoint::Refresh | AuthEndpoint::Logout => {
            let Some(token) = fields.refresh_token() else {
                return Err(AppError::bad_request(
                    "INVALID_REFRESH_REQUEST",
                    "refreshToken is required",
                ));
            };
            if state.policy.config().prevalidate_refresh_token_type
                && !state.refresh_verifier.is_refresh_token(token)
            {
                tracing::warn!(path = %exchange.path(), "refresh token rejected before forwarding");
                return Err(AppError::Unauthorized);
            }
        }
    }

    Ok(exchange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_fields_only() {
        let fields = CredentialFields::parse(&Bytes::from_static(
            br#"{"username":" alice ","password":"","refreshToken":42}"#,
        ));
        assert_eq!(fields.username(), Some("alice"));
        assert_eq!(fields.password(), None);
        assert_eq!(fields.refresh_token(), None);
    }

    #[test]
    fn garbage_body_has_no_fields() {
        let fields = CredentialFields::parse(&Bytes::from_static(b"username=alice"));
        assert!(fields.username().is_none());
    }
}
