pub mod access_jwt;
pub mod access_rules;
pub mod claims;
pub mod factory;
pub mod principal;
pub mod refresh_jwt;
pub mod role;

pub use access_jwt::{AccessJwtError, AccessTokenVerifier, JwtPolicy};
pub use factory::{build_access_verifier, build_refresh_verifier};
pub use principal::Principal;
pub use refresh_jwt::RefreshTokenVerifier;
pub use role::Role;
