use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::{Map, Value};
use thiserror::Error;

use super::claims::{ClaimViolation, ClaimsValidator, DelegatingValidator, TokenClaims, ValidationMode};
use super::principal::Principal;
use super::role::Role;

/// Shared HS256 settings for access and refresh tokens.
#[derive(Clone)]
pub struct JwtPolicy {
    pub issuer: String,
    pub audience: String,
    pub secret: String,
    pub clock_skew_seconds: u64,
}

impl fmt::Debug for JwtPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtPolicy")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

/// Errors returned by access-token verification + custom claim validation.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("{}", describe_jwt_error(.0))]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("{0}")]
    Claims(#[from] ClaimViolation),
}

fn describe_jwt_error(e: &jsonwebtoken::errors::Error) -> String {
    match e.kind() {
        ErrorKind::ExpiredSignature => "token expired".to_string(),
        ErrorKind::ImmatureSignature => "token not yet valid".to_string(),
        ErrorKind::InvalidIssuer => "invalid issuer".to_string(),
        ErrorKind::InvalidSignature => "invalid signature".to_string(),
        ErrorKind::InvalidAlgorithm => "unsupported algorithm".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("{} is required", claim),
        _ => "malformed token".to_string(),
    }
}

/// HS256 access-token verifier.
///
/// - `jsonwebtoken` checks signature, `exp` / `nbf` (with leeway) and `iss`
/// - audience and the remaining claims go through the `DelegatingValidator`
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    claims_validator: DelegatingValidator,
}

impl fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AccessTokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessTokenVerifier {
    pub fn new(policy: &JwtPolicy) -> Self {
        Self::with_mode(policy, ValidationMode::FirstFailure)
    }

    pub fn with_mode(policy: &JwtPolicy, mode: ValidationMode) -> Self {
        let decoding_key = DecodingKey::from_secret(policy.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[policy.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_nbf = true;
        // checked by RequiredAudienceValidator so the reason is readable
        validation.validate_aud = false;
        validation.leeway = policy.clock_skew_seconds;

        let claims_validator = DelegatingValidator::access_token(
            &policy.audience,
            policy.clock_skew_seconds as i64,
            mode,
        );

        Self {
            decoding_key,
            validation,
            claims_validator,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AccessJwtError> {
        let data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;
        let claims = TokenClaims::new(data.claims);

        self.claims_validator.validate(&claims)?;

        let subject = claims.subject().unwrap_or_default().to_string();
        // validated above; USER is the floor if the role rule is ever dropped
        let role = claims
            .get_str("role")
            .and_then(Role::from_claim)
            .unwrap_or(Role::User);

        Ok(Principal::new(subject, role).with_token(token, claims))
    }
}
