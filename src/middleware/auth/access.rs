//! Bearer authentication + route authorization stages.
//!
//! - A presented bearer token must verify (signature, exp/nbf, iss, custom claims)
//!   on every route, public ones included; failure is 401 invalid_token.
//! - No token is fine at this point; the access table decides whether the
//!   route needs a principal (401) or a particular authority (403).

use axum::http::header;

use crate::error::AppError;
use crate::middleware::exchange::Exchange;
use crate::services::auth::access_rules::{self, Denied};
use crate::state::AppState;

enum Credential<'a> {
    Absent,
    Bearer(&'a str),
    Malformed,
}

fn bearer_credential(exchange: &Exchange) -> Credential<'_> {
    let Some(value) = exchange.headers().get(header::AUTHORIZATION) else {
        return Credential::Absent;
    };
    let Ok(value) = value.to_str() else {
        return Credential::Malformed;
    };

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Credential::Malformed
            } else {
                Credential::Bearer(token)
            }
        }
        // other schemes are not ours to judge
        _ if !value.trim().eq_ignore_ascii_case("bearer") => Credential::Absent,
        _ => Credential::Malformed,
    }
}

pub async fn authenticate(state: &AppState, mut exchange: Exchange) -> Result<Exchange, AppError> {
    let principal = match bearer_credential(&exchange) {
        Credential::Absent => return Ok(exchange),
        Credential::Malformed => {
            tracing::warn!(path = %exchange.path(), "malformed bearer credential");
            return Err(AppError::InvalidToken("Bearer token is malformed".into()));
        }
        Credential::Bearer(token) => match state.access_verifier.verify(token) {
            Ok(principal) => principal,
            Err(err) => {
                tracing::warn!(
                    path = %exchange.path(),
                    reason = %err,
                    "access token verification failed"
                );
                return Err(err.into());
            }
        },
    };

    tracing::debug!(subject = %principal.subject, role = %principal.role, "authenticated");
    exchange.principal = Some(principal);
    Ok(exchange)
}

pub async fn authorize(exchange: Exchange) -> Result<Exchange, AppError> {
    let access = access_rules::required_access(exchange.method(), exchange.path());

    match access.check(exchange.principal.as_ref()) {
        Ok(()) => Ok(exchange),
        Err(Denied::Unauthenticated) => {
            tracing::warn!(
                method = %exchange.method(),
                path = %exchange.path(),
                "authentication required"
            );
            Err(AppError::Unauthorized)
        }
        Err(Denied::Forbidden) => {
            tracing::warn!(
                method = %exchange.method(),
                path = %exchange.path(),
                subject = exchange.principal.as_ref().map(|p| p.subject.as_str()),
                "insufficient authority"
            );
            Err(AppError::Forbidden)
        }
    }
}
