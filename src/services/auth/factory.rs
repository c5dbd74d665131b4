/// Factory: build the token verifiers from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AccessTokenVerifier, RefreshTokenVerifier};

pub fn build_access_verifier(config: &Config) -> Arc<AccessTokenVerifier> {
    Arc::new(AccessTokenVerifier::new(&config.jwt))
}

pub fn build_refresh_verifier(config: &Config) -> Arc<RefreshTokenVerifier> {
    Arc::new(RefreshTokenVerifier::new(&config.jwt))
}
