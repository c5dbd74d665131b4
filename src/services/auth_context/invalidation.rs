use std::sync::Arc;

use crate::services::cache::{CacheClient, CacheError};

use super::keys;

/// Evicts every cached context of a subject via its index.
#[derive(Clone)]
pub struct InvalidationService {
    cache: Arc<dyn CacheClient>,
}

impl std::fmt::Debug for InvalidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationService")
            .field("backend", &self.cache.backend_name())
            .finish()
    }
}

impl InvalidationService {
    pub fn new(cache: Arc<dyn CacheClient>) -> Self {
        Self { cache }
    }

    pub async fn invalidate_on_logout(&self, subject: &str) -> u64 {
        self.invalidate_by_subject(subject).await
    }

    pub async fn invalidate_on_role_changed(&self, subject: &str) -> u64 {
        self.invalidate_by_subject(subject).await
    }

    /// Deletes the index key and all of its members in one DEL and returns
    /// the store's count (index included). Failures are logged and count as 0.
    pub async fn invalidate_by_subject(&self, subject: &str) -> u64 {
        let index_key = keys::subject_index_key(subject);
        match self.evict(&index_key).await {
            Ok(removed) => {
                tracing::info!(subject = %subject, removed, "auth context invalidated");
                removed
            }
            Err(err) => {
                tracing::warn!(
                    subject = %subject,
                    backend = self.cache.backend_name(),
                    error = %err,
                    "auth context invalidation failed"
                );
                0
            }
        }
    }

    async fn evict(&self, index_key: &str) -> Result<u64, CacheError> {
        let members = self.cache.set_members(index_key).await?;

        let mut targets = Vec::with_capacity(members.len() + 1);
        targets.push(index_key.to_string());
        targets.extend(members);

        self.cache.del_many(&targets).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::{Principal, Role, claims::TokenClaims};
    use crate::services::auth_context::{AuthContextConfig, AuthContextService};
    use crate::services::cache::MemoryCacheClient;
    use crate::test_support::FailingCache;

    const SUBJECT: &str = "8f14e45f-ceea-467f-a8a1-6c0b2c8b6d34";

    #[tokio::test]
    async fn removes_index_and_members() {
        let cache: Arc<dyn CacheClient> = Arc::new(MemoryCacheClient::new());
        let resolver = AuthContextService::new(cache.clone(), AuthContextConfig::default());
        let invalidation = InvalidationService::new(cache.clone());

        for token in ["a", "b"] {
            let p = Principal::new(SUBJECT, Role::Admin).with_token(token, TokenClaims::default());
            resolver.resolve(&p).await;
        }

        assert_eq!(invalidation.invalidate_on_logout(SUBJECT).await, 3);
        // nothing left; the next resolve is a miss again
        assert_eq!(invalidation.invalidate_on_role_changed(SUBJECT).await, 0);
        let p = Principal::new(SUBJECT, Role::Admin).with_token("a", TokenClaims::default());
        assert!(!resolver.resolve(&p).await.cache_hit);
    }

    #[tokio::test]
    async fn unknown_subject_is_zero() {
        let invalidation = InvalidationService::new(Arc::new(MemoryCacheClient::new()));
        assert_eq!(invalidation.invalidate_by_subject("nobody").await, 0);
    }

    #[tokio::test]
    async fn store_failure_reports_zero() {
        let invalidation = InvalidationService::new(Arc::new(FailingCache));
        assert_eq!(invalidation.invalidate_by_subject(SUBJECT).await, 0);
    }
}
