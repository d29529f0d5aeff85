//! Port for the key/value cache and its typed wrapper.
//!
//! The raw port speaks strings so it stays object-safe and mockable; the
//! [`TypedCache`] wrapper layers serde and the key convention
//! `resonate:{entity}:{id}:{dataType}` on top.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{UserId, canonical_pair};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cache adapters.
    pub enum CacheError {
        /// The cache backend is unreachable.
        Connection { message: String } =>
            "cache connection failed: {message}",
        /// A cache command failed during execution.
        Command { message: String } =>
            "cache command failed: {message}",
        /// A cached payload could not be (de)serialized.
        Serialization { message: String } =>
            "cache serialization failed: {message}",
    }
}

/// TTL for a cache write. `None` means the entry never expires.
pub type CacheTtl = Option<std::time::Duration>;

/// Raw cache operations over string payloads.
///
/// `scan_delete` must be iterative and non-blocking on the backend; callers
/// rely on it for pattern invalidation (`user:{id}:*`) after profile
/// rebuilds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_raw(&self, key: &str, value: &str, ttl: CacheTtl) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete all keys matching `pattern`, where the only supported wildcard
    /// is a trailing `*`. Returns the number of keys removed.
    async fn scan_delete(&self, pattern: &str) -> Result<usize, CacheError>;

    async fn sadd(&self, key: &str, member: &str) -> Result<(), CacheError>;

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CacheError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// Key-space namespace applied in front of every logical key.
const NAMESPACE: &str = "resonate";

/// Cache key builders for the core's derived artifacts.
///
/// Logical keys follow `{entity}:{id}:{dataType}`; the namespace prefix is
/// applied uniformly so pattern invalidation and point reads agree.
pub struct CacheKeys;

impl CacheKeys {
    fn namespaced(logical: &str) -> String {
        format!("{NAMESPACE}:{logical}")
    }

    /// Cached resonance profile projection.
    pub fn profile(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:profile"))
    }

    /// Full ranked feed for a viewer.
    pub fn feed_ranked(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:feed_ranked"))
    }

    /// One emitted feed page for a viewer.
    pub fn feed_page(user_id: UserId, cursor: &str) -> String {
        Self::namespaced(&format!("user:{user_id}:feed_page_{cursor}"))
    }

    /// Pairwise resonance score, keyed by the sorted pair.
    pub fn resonance_score(a: UserId, b: UserId) -> String {
        let (min, max) = canonical_pair(a, b);
        Self::namespaced(&format!("ers:{min}:{max}:score"))
    }

    /// Set of users the given user has blocked.
    pub fn blocked_set(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:blocked_users"))
    }

    /// Set of users the given user has passed on.
    pub fn passed_set(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:passed_users"))
    }

    /// Set of users the given user has already resonated with.
    pub fn resonated_set(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:resonated_users"))
    }

    /// Set of users who have blocked the given user.
    pub fn blocked_by_set(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:blocked_by"))
    }

    /// Invalidation pattern covering every derived artifact for one user.
    pub fn user_pattern(user_id: UserId) -> String {
        Self::namespaced(&format!("user:{user_id}:*"))
    }
}

/// Serde-aware wrapper over the raw cache port.
#[derive(Clone)]
pub struct TypedCache {
    store: Arc<dyn CacheStore>,
}

impl TypedCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Access the underlying raw store (set operations, ping).
    pub fn raw(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Read and deserialize a cached value.
    ///
    /// A payload that no longer matches the expected shape reads as a miss;
    /// the stale entry is removed so the next write repopulates it.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.store.get_raw(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::debug!(key, %error, "evicting cache entry with stale shape");
                self.store.delete(key).await?;
                Ok(None)
            }
        }
    }

    /// Serialize and write a value with the given TTL.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: CacheTtl,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)
            .map_err(|error| CacheError::serialization(error.to_string()))?;
        self.store.set_raw(key, &raw, ttl).await
    }

    /// Remove every derived artifact for one user.
    pub async fn invalidate_user(&self, user_id: UserId) -> Result<usize, CacheError> {
        self.store
            .scan_delete(&CacheKeys::user_pattern(user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_the_namespace_prefix() {
        let user = UserId::random();
        assert_eq!(
            CacheKeys::feed_ranked(user),
            format!("resonate:user:{user}:feed_ranked")
        );
        assert_eq!(
            CacheKeys::feed_page(user, "2"),
            format!("resonate:user:{user}:feed_page_2")
        );
        assert!(CacheKeys::user_pattern(user).ends_with(":*"));
    }

    #[test]
    fn resonance_score_key_is_order_independent() {
        let a = UserId::random();
        let b = UserId::random();
        assert_eq!(
            CacheKeys::resonance_score(a, b),
            CacheKeys::resonance_score(b, a)
        );
    }

    #[test]
    fn user_pattern_prefixes_every_user_key() {
        let user = UserId::random();
        let pattern = CacheKeys::user_pattern(user);
        let prefix = pattern.trim_end_matches('*');
        for key in [
            CacheKeys::profile(user),
            CacheKeys::feed_ranked(user),
            CacheKeys::feed_page(user, "0"),
            CacheKeys::blocked_set(user),
            CacheKeys::passed_set(user),
            CacheKeys::resonated_set(user),
            CacheKeys::blocked_by_set(user),
        ] {
            assert!(key.starts_with(prefix), "{key} outside {pattern}");
        }
    }
}
