use std::sync::Arc;
use std::time::Duration;

use crate::services::auth::Principal;
use crate::services::cache::{CacheClient, CacheError};

use super::{AuthContextConfig, keys, payload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub payload: String,
    pub cache_hit: bool,
}

impl Resolution {
    fn miss(payload: String) -> Self {
        Self {
            payload,
            cache_hit: false,
        }
    }

    /// Value of `X-Auth-Context-Cache`.
    pub fn cache_status(&self) -> &'static str {
        if self.cache_hit { "HIT" } else { "MISS" }
    }
}

/// Cache-aside resolver for the per-request identity payload.
///
/// Entries are never refreshed on a hit; the TTL set on population governs.
/// Any store failure degrades to a freshly built payload (fail-open).
#[derive(Clone)]
pub struct AuthContextService {
    cache: Arc<dyn CacheClient>,
    ttl: Duration,
}

impl std::fmt::Debug for AuthContextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContextService")
            .field("backend", &self.cache.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl AuthContextService {
    pub fn new(cache: Arc<dyn CacheClient>, config: AuthContextConfig) -> Self {
        Self {
            cache,
            ttl: config.ttl,
        }
    }

    pub async fn resolve(&self, principal: &Principal) -> Resolution {
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        let owned = principal.clone();

        // Detached from the request future: a client disconnect must not
        // leave the entry written but the index not.
        let task = tokio::spawn(async move {
            let key = keys::cache_key(&owned);
            match lookup_or_populate(cache.as_ref(), &key, ttl, &owned).await {
                Ok(resolution) => resolution,
                Err(err) => {
                    tracing::warn!(
                        backend = cache.backend_name(),
                        error = %err,
                        "auth context cache unavailable; continuing without cache"
                    );
                    Resolution::miss(payload::build(&owned))
                }
            }
        });

        match task.await {
            Ok(resolution) => resolution,
            Err(err) => {
                tracing::error!(error = %err, "auth context population task failed");
                Resolution::miss(payload::build(principal))
            }
        }
    }
}

async fn lookup_or_populate(
    cache: &dyn CacheClient,
    key: &str,
    ttl: Duration,
    principal: &Principal,
) -> Result<Resolution, CacheError> {
    if let Some(cached) = cache.get_string(key).await? {
        tracing::debug!(subject = %principal.subject, "auth context cache hit");
        return Ok(Resolution {
            payload: cached,
            cache_hit: true,
        });
    }

    let payload = payload::build(principal);
    cache.set_with_ttl(key, &payload, ttl).await?;

    let index_key = keys::subject_index_key(&principal.subject);
    cache.set_add(&index_key, key).await?;
    cache.expire(&index_key, ttl).await?;

    tracing::debug!(subject = %principal.subject, "auth context cache miss; populated");
    Ok(Resolution::miss(payload))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::auth::{Role, claims::TokenClaims};
    use crate::services::cache::{CacheResult, MemoryCacheClient};
    use crate::test_support::FailingCache;

    /// Memory store whose writes stall, so callers can give up mid-population.
    struct SlowWrites(MemoryCacheClient);

    #[async_trait]
    impl CacheClient for SlowWrites {
        fn backend_name(&self) -> &'static str {
            "slow"
        }

        async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
            self.0.get_string(key).await
        }

        async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.set_with_ttl(key, value, ttl).await
        }

        async fn set_add(&self, key: &str, member: &str) -> CacheResult<u64> {
            self.0.set_add(key, member).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
            self.0.expire(key, ttl).await
        }

        async fn set_members(&self, key: &str) -> CacheResult<Vec<String>> {
            self.0.set_members(key).await
        }

        async fn del_many(&self, keys: &[String]) -> CacheResult<u64> {
            self.0.del_many(keys).await
        }
    }

    fn principal(token: &str) -> Principal {
        Principal::new("8f14e45f-ceea-467f-a8a1-6c0b2c8b6d34", Role::User)
            .with_token(token, TokenClaims::default())
    }

    #[tokio::test]
    async fn second_resolve_is_a_hit_with_identical_payload() {
        let cache = Arc::new(MemoryCacheClient::new());
        let service = AuthContextService::new(cache.clone(), AuthContextConfig::default());
        let p = principal("token-a");

        let first = service.resolve(&p).await;
        let second = service.resolve(&p).await;

        assert!(!first.cache_hit);
        assert_eq!(first.cache_status(), "MISS");
        assert!(second.cache_hit);
        assert_eq!(second.cache_status(), "HIT");
        assert_eq!(first.payload, second.payload);

        let index = keys::subject_index_key(&p.subject);
        assert_eq!(
            cache.set_members(&index).await.unwrap(),
            vec![keys::cache_key(&p)]
        );
    }

    #[tokio::test]
    async fn distinct_tokens_get_distinct_entries_under_one_index() {
        let cache = Arc::new(MemoryCacheClient::new());
        let service = AuthContextService::new(cache.clone(), AuthContextConfig::default());

        service.resolve(&principal("token-a")).await;
        service.resolve(&principal("token-b")).await;

        let index = keys::subject_index_key("8f14e45f-ceea-467f-a8a1-6c0b2c8b6d34");
        assert_eq!(cache.set_members(&index).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let service = AuthContextService::new(Arc::new(FailingCache), AuthContextConfig::default());

        let resolution = service.resolve(&principal("token-a")).await;
        assert!(!resolution.cache_hit);
        let payload: serde_json::Value = serde_json::from_str(&resolution.payload).unwrap();
        assert_eq!(payload["subject"], "8f14e45f-ceea-467f-a8a1-6c0b2c8b6d34");
    }

    #[tokio::test]
    async fn population_completes_after_the_caller_goes_away() {
        let cache = Arc::new(SlowWrites(MemoryCacheClient::new()));
        let service = AuthContextService::new(cache.clone(), AuthContextConfig::default());
        let p = principal("token-a");

        let abandoned =
            tokio::time::timeout(Duration::from_millis(5), service.resolve(&p)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        let index = keys::subject_index_key(&p.subject);
        assert_eq!(
            cache.set_members(&index).await.unwrap(),
            vec![keys::cache_key(&p)]
        );
        assert!(cache.get_string(&keys::cache_key(&p)).await.unwrap().is_some());
    }
}
