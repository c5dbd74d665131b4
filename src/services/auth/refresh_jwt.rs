use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use super::access_jwt::JwtPolicy;

/// Cheap pre-check for refresh/logout bodies: the token must carry an HMAC
/// signature under our secret (HS256, HS384 or HS512) and
/// `token_type == "REFRESH"`. Expiry is left to the auth service.
pub struct RefreshTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for RefreshTokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenVerifier").finish_non_exhaustive()
    }
}

impl RefreshTokenVerifier {
    pub fn new(policy: &JwtPolicy) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(policy.secret.as_bytes()),
            validation,
        }
    }

    pub fn is_refresh_token(&self, token: &str) -> bool {
        jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.get("token_type").and_then(Value::as_str) == Some("REFRESH"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TEST_SECRET, jwt_policy, mint, mint_with_secret, refresh_claims};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    #[test]
    fn accepts_only_signed_refresh_tokens() {
        let verifier = RefreshTokenVerifier::new(&jwt_policy());

        assert!(verifier.is_refresh_token(&mint(&refresh_claims())));

        let mut access = refresh_claims();
        access["token_type"] = json!("ACCESS");
        assert!(!verifier.is_refresh_token(&mint(&access)));

        let forged = mint_with_secret(&refresh_claims(), "another-secret-that-is-long-enough!!");
        assert!(!verifier.is_refresh_token(&forged));

        assert!(!verifier.is_refresh_token("garbage"));
    }

    #[test]
    fn expiry_is_not_checked() {
        let verifier = RefreshTokenVerifier::new(&jwt_policy());
        let mut claims = refresh_claims();
        claims["exp"] = json!(1_000);
        assert!(verifier.is_refresh_token(&mint(&claims)));
    }

    #[test]
    fn any_hmac_algorithm_is_accepted() {
        let verifier = RefreshTokenVerifier::new(&jwt_policy());
        let key = EncodingKey::from_secret(TEST_SECRET.as_bytes());

        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token =
                jsonwebtoken::encode(&Header::new(alg), &refresh_claims(), &key).unwrap();
            assert!(verifier.is_refresh_token(&token), "{alg:?}");
        }
    }
}
