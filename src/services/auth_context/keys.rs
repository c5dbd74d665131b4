use sha2::{Digest, Sha256};

use crate::services::auth::Principal;

const TOKEN_KEY_PREFIX: &str = "cache:token";
const TOKEN_INDEX_PREFIX: &str = "cache:token-index";

pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// `cache:token:{sha256(subject ":" sha256(token))}`; the raw token never appears.
pub fn token_key(subject: &str, token: &str) -> String {
    let fingerprint = sha256_hex(&format!("{}:{}", subject, sha256_hex(token)));
    format!("{}:{}", TOKEN_KEY_PREFIX, fingerprint)
}

/// `cache:token:{sha256(name)}` for principals without a bearer token.
pub fn principal_key(name: &str) -> String {
    format!("{}:{}", TOKEN_KEY_PREFIX, sha256_hex(name))
}

pub fn subject_index_key(subject: &str) -> String {
    format!("{}:{}", TOKEN_INDEX_PREFIX, subject)
}

pub fn cache_key(principal: &Principal) -> String {
    match principal.token.as_deref() {
        Some(token) => token_key(&principal.subject, token),
        None => principal_key(principal.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::{Role, claims::TokenClaims};

    #[test]
    fn token_key_is_a_fingerprint() {
        let key = token_key("subject-1", "eyJ.secret.token");
        assert!(key.starts_with("cache:token:"));
        assert_eq!(key.len(), "cache:token:".len() + 64);
        assert!(!key.contains("secret"));
        assert!(!key.contains("subject-1"));

        assert_eq!(key, token_key("subject-1", "eyJ.secret.token"));
        assert_ne!(key, token_key("subject-2", "eyJ.secret.token"));
        assert_ne!(key, token_key("subject-1", "eyJ.other.token"));
    }

    #[test]
    fn cache_key_depends_on_token_presence() {
        let bare = Principal::new("subject-1", Role::User);
        assert_eq!(cache_key(&bare), principal_key("subject-1"));

        let with_token = bare.with_token("t", TokenClaims::default());
        assert_eq!(cache_key(&with_token), token_key("subject-1", "t"));
    }

    #[test]
    fn index_key_format() {
        assert_eq!(subject_index_key("abc"), "cache:token-index:abc");
    }
}
