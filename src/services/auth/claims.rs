/*
 * Responsibility
 * - Custom claim rules applied after jsonwebtoken has checked signature / exp / nbf / iss
 * - One small validator per rule, composed in order by DelegatingValidator
 * - Each failure carries a readable reason that ends up in the invalid_token challenge
 */
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Decoded claim set, kept loosely typed so every rule reports its own reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenClaims(Map<String, Value>);

impl TokenClaims {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// NumericDate claims; fractional seconds are truncated.
    pub fn get_seconds(&self, name: &str) -> Option<i64> {
        let value = self.0.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// `aud` may be a single string or an array of strings.
    pub fn audiences(&self) -> Vec<&str> {
        match self.0.get("aud") {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ClaimViolation(pub String);

impl ClaimViolation {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

pub trait ClaimsValidator: Send + Sync {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation>;
}

#[derive(Debug, Clone, Copy)]
pub struct TokenTypeValidator {
    pub expected: &'static str,
}

impl ClaimsValidator for TokenTypeValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        if claims.get_str("token_type") == Some(self.expected) {
            Ok(())
        } else {
            Err(ClaimViolation::new(format!(
                "token_type must be {}",
                self.expected
            )))
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubjectUuidValidator;

impl ClaimsValidator for SubjectUuidValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        match claims.subject() {
            Some(sub) if Uuid::parse_str(sub).is_ok() => Ok(()),
            _ => Err(ClaimViolation::new("sub must be UUID")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoleValidator;

impl ClaimsValidator for RoleValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        match claims.get_str("role").and_then(super::Role::from_claim) {
            Some(_) => Ok(()),
            None => Err(ClaimViolation::new(
                "role must be one of USER, ORGANIZER, ADMIN",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JtiValidator;

impl ClaimsValidator for JtiValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        match claims.get_str("jti") {
            Some(jti) if !jti.trim().is_empty() => Ok(()),
            _ => Err(ClaimViolation::new("jti is required")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IssuedAtValidator {
    pub clock_skew_seconds: i64,
    clock: fn() -> i64,
}

impl IssuedAtValidator {
    pub fn new(clock_skew_seconds: i64) -> Self {
        Self {
            clock_skew_seconds,
            clock: system_now,
        }
    }

    pub fn with_clock(clock_skew_seconds: i64, clock: fn() -> i64) -> Self {
        Self {
            clock_skew_seconds,
            clock,
        }
    }
}

impl ClaimsValidator for IssuedAtValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        let Some(iat) = claims.get_seconds("iat") else {
            return Err(ClaimViolation::new("iat is required"));
        };
        if iat > (self.clock)() + self.clock_skew_seconds {
            return Err(ClaimViolation::new("iat cannot be in the future"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RequiredAudienceValidator {
    pub audience: String,
}

impl ClaimsValidator for RequiredAudienceValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        if claims.audiences().contains(&self.audience.as_str()) {
            Ok(())
        } else {
            Err(ClaimViolation::new(format!(
                "Missing required audience: {}",
                self.audience
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    FirstFailure,
    /// Run every rule and join the reasons with "; ".
    CollectAll,
}

/// Ordered composition of independent rules.
#[derive(Default)]
pub struct DelegatingValidator {
    validators: Vec<Box<dyn ClaimsValidator>>,
    mode: ValidationMode,
}

impl DelegatingValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            validators: Vec::new(),
            mode,
        }
    }

    pub fn with(mut self, validator: impl ClaimsValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Rules an access token must satisfy beyond signature, expiry and issuer.
    pub fn access_token(audience: &str, clock_skew_seconds: i64, mode: ValidationMode) -> Self {
        Self::new(mode)
            .with(RequiredAudienceValidator {
                audience: audience.to_string(),
            })
            .with(TokenTypeValidator { expected: "ACCESS" })
            .with(SubjectUuidValidator)
            .with(RoleValidator)
            .with(JtiValidator)
            .with(IssuedAtValidator::new(clock_skew_seconds))
    }
}

impl ClaimsValidator for DelegatingValidator {
    fn validate(&self, claims: &TokenClaims) -> Result<(), ClaimViolation> {
        match self.mode {
            ValidationMode::FirstFailure => self
                .validators
                .iter()
                .try_for_each(|v| v.validate(claims)),
            ValidationMode::CollectAll => {
                let reasons: Vec<String> = self
                    .validators
                    .iter()
                    .filter_map(|v| v.validate(claims).err())
                    .map(|violation| violation.0)
                    .collect();
                if reasons.is_empty() {
                    Ok(())
                } else {
                    Err(ClaimViolation(reasons.join("; ")))
                }
            }
        }
    }
}

fn system_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
