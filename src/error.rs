/*
 * Responsibility
 * - Gateway-wide AppError (one variant per rejection class of the pipeline)
 * - IntoResponse (HTTP status / JSON error body / auth challenge header)
 * - Conversions from lower-layer errors that are allowed to surface
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AccessJwtError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    // malformed request body on the auth endpoints
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    // missing credentials, or a forged refresh token
    #[error("unauthorized")]
    Unauthorized,
    // bearer token failed signature / standard / custom claim checks
    #[error("invalid_token: {0}")]
    InvalidToken(String),
    // policy rejection (https, host), insufficient role, bad internal token
    #[error("forbidden")]
    Forbidden,
    // no allow rule matched; deliberately not 403
    #[error("not found")]
    NotFound,
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("too many requests")]
    RateLimited { retry_after_seconds: u64 },
    #[error("bad gateway")]
    BadGateway,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadGateway => StatusCode::BAD_GATEWAY,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::BadRequest { code, message } => (*code, message.clone()),
            AppError::Unauthorized => ("UNAUTHORIZED", "unauthorized".into()),
            AppError::InvalidToken(reason) => ("INVALID_TOKEN", reason.clone()),
            AppError::Forbidden => ("FORBIDDEN", "forbidden".into()),
            AppError::NotFound => ("NOT_FOUND", "not found".into()),
            AppError::UnsupportedMediaType => (
                "UNSUPPORTED_MEDIA_TYPE",
                "content type must be application/json".into(),
            ),
            AppError::PayloadTooLarge => ("PAYLOAD_TOO_LARGE", "payload too large".into()),
            AppError::RateLimited { .. } => ("RATE_LIMITED", "too many requests".into()),
            AppError::BadGateway => ("BAD_GATEWAY", "upstream unavailable".into()),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };
        let mut response = (status, Json(body)).into_response();

        match &self {
            AppError::InvalidToken(reason) => {
                // RFC 6750 challenge; quotes would break the quoted-string
                let challenge = format!(
                    "Bearer error=\"invalid_token\", error_description=\"{}\"",
                    reason.replace('"', "'")
                );
                if let Ok(value) = HeaderValue::from_str(&challenge) {
                    response
                        .headers_mut()
                        .insert(header::WWW_AUTHENTICATE, value);
                }
            }
            AppError::Unauthorized => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            AppError::RateLimited {
                retry_after_seconds,
            } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_seconds));
            }
            _ => {}
        }

        response
    }
}

impl From<AccessJwtError> for AppError {
    fn from(e: AccessJwtError) -> Self {
        AppError::InvalidToken(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_carries_bearer_challenge() {
        let response = AppError::InvalidToken("token_type must be ACCESS".into()).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(challenge.starts_with("Bearer error=\"invalid_token\""));
        assert!(challenge.contains("token_type must be ACCESS"));
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_seconds: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn policy_rejections_map_to_distinct_statuses() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::UnsupportedMediaType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
