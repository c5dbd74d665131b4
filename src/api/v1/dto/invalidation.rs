/*
 * Responsibility
 * - Request/response DTO of the cache invalidation webhook
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidationEventType {
    Logout,
    RoleChanged,
    // accepted and ignored
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationEventRequest {
    pub event_type: InvalidationEventType,
    pub subject: String,
}

impl InvalidationEventRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.subject.trim().is_empty() {
            return Err("subject is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationEventResponse {
    pub invalidated_keys: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_type_deserializes() {
        let req: InvalidationEventRequest =
            serde_json::from_str(r#"{"eventType":"PASSWORD_RESET","subject":"s"}"#).unwrap();
        assert_eq!(req.event_type, InvalidationEventType::Unknown);

        let req: InvalidationEventRequest =
            serde_json::from_str(r#"{"eventType":"ROLE_CHANGED","subject":"s"}"#).unwrap();
        assert_eq!(req.event_type, InvalidationEventType::RoleChanged);
    }

    #[test]
    fn response_uses_camel_case() {
        let body = serde_json::to_string(&InvalidationEventResponse { invalidated_keys: 3 }).unwrap();
        assert_eq!(body, r#"{"invalidatedKeys":3}"#);
    }
}
