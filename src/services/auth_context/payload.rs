use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::services::auth::Principal;

/// Serialized identity payload forwarded as `X-Auth-Context`:
/// `{subject, roles, claims?, cachedAt}`.
pub fn build(principal: &Principal) -> String {
    let mut payload = json!({
        "subject": principal.subject,
        "roles": principal.authorities,
        "cachedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    });

    if let (Some(claims), Value::Object(map)) = (&principal.claims, &mut payload) {
        map.insert("claims".to_string(), Value::Object(claims.as_map().clone()));
    }

    payload.to_string()
}
