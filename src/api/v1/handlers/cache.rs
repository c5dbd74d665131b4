/*
 * Responsibility
 * - POST /internal/v1/cache/invalidation
 * - Shared-secret check (X-Internal-Token) before the body is even parsed
 * - Dispatch LOGOUT / ROLE_CHANGED to the invalidation service
 */
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use subtle::ConstantTimeEq;

use crate::{
    api::v1::dto::invalidation::{
        InvalidationEventRequest, InvalidationEventResponse, InvalidationEventType,
    },
    error::AppError,
    headers,
    state::AppState,
};

pub async fn invalidate(
    State(state): State<AppState>,
    request_headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<InvalidationEventResponse>), AppError> {
    let presented = request_headers
        .get(headers::INTERNAL_TOKEN)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !bool::from(presented.ct_eq(state.internal_event_token.as_bytes())) {
        tracing::warn!("invalidation event rejected: bad internal token");
        return Err(AppError::Forbidden);
    }

    let req: InvalidationEventRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request("INVALID_EVENT", e.to_string()))?;
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_EVENT", msg))?;

    let invalidated_keys = match req.event_type {
        InvalidationEventType::Logout => state.invalidation.invalidate_on_logout(&req.subject).await,
        InvalidationEventType::RoleChanged => {
            state
                .invalidation
                .invalidate_on_role_changed(&req.subject)
                .await
        }
        InvalidationEventType::Unknown => {
            tracing::info!(subject = %req.subject, "ignoring unknown invalidation event type");
            0
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(InvalidationEventResponse { invalidated_keys }),
    ))
}
