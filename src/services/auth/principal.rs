use std::fmt;

use super::claims::TokenClaims;
use super::role::Role;

/// Verified caller for the lifetime of one request.
#[derive(Clone)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
    pub authorities: Vec<&'static str>,
    /// Raw bearer token, used only to derive the cache fingerprint.
    pub token: Option<String>,
    pub claims: Option<TokenClaims>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
            authorities: role.authorities().to_vec(),
            token: None,
            claims: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, claims: TokenClaims) -> Self {
        self.token = Some(token.into());
        self.claims = Some(claims);
        self
    }

    pub fn name(&self) -> &str {
        &self.subject
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| *a == authority)
    }

    pub fn authorities_header(&self) -> String {
        self.authorities.join(",")
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the bearer token
        f.debug_struct("Principal")
            .field("subject", &self.subject)
            .field("role", &self.role)
            .field("authorities", &self.authorities)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}
