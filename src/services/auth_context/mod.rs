//! Auth-context cache: cache-aside identity payloads keyed by a token
//! fingerprint, plus a per-subject index so a subject can be evicted in bulk.
pub mod invalidation;
pub mod keys;
pub mod payload;
pub mod resolver;

use std::time::Duration;

pub use invalidation::InvalidationService;
pub use resolver::{AuthContextService, Resolution};

#[derive(Debug, Clone, Copy)]
pub struct AuthContextConfig {
    /// Entry TTL; the subject index gets the same TTL on every write.
    pub ttl: Duration,
}

impl Default for AuthContextConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}
