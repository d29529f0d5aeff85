//! Port for the dense-vector store consumed by candidate retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CommunicationStyle, EnergyArchetype, SubscriptionTier, UserId};

use super::define_port_error;

/// Dimensionality of the semantic embedding vectors.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

define_port_error! {
    /// Errors raised by vector store adapters.
    pub enum VectorStoreError {
        /// The store RPC failed or was unreachable.
        Upstream { message: String } =>
            "vector store call failed: {message}",
        /// The supplied vector has the wrong dimensionality.
        DimensionMismatch { expected: usize, actual: usize } =>
            "vector dimension mismatch: expected {expected}, found {actual}",
    }
}

/// Metadata stored alongside each user vector, used for ANN filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorMetadata {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<EnergyArchetype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CommunicationStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub subscription_tier: SubscriptionTier,
    /// Last-active instant as an ISO-8601 string.
    pub last_active: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<(u8, u8)>,
}

/// Metadata filter applied server-side by the ANN query.
///
/// Mirrors the store's `{field: {$ne: value}}` negation operator; the only
/// negation the core needs is excluding the querying user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id_not: Option<UserId>,
}

impl VectorFilter {
    /// Filter excluding a single user id.
    pub fn excluding_user(user_id: UserId) -> Self {
        Self {
            user_id_not: Some(user_id),
        }
    }

    /// Whether `metadata` passes the filter.
    pub fn matches(&self, metadata: &VectorMetadata) -> bool {
        match self.user_id_not {
            Some(excluded) => metadata.user_id != excluded,
            None => true,
        }
    }
}

/// One scored hit from a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub user_id: UserId,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f64,
    pub metadata: VectorMetadata,
}

/// Port for per-user dense vectors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector for `metadata.user_id`.
    async fn upsert(
        &self,
        values: &[f32],
        metadata: &VectorMetadata,
    ) -> Result<(), VectorStoreError>;

    /// Fetch the stored vector for one user.
    async fn fetch(&self, user_id: UserId) -> Result<Option<Vec<f32>>, VectorStoreError>;

    /// Approximate nearest neighbours of `vector`, filtered by `filter`,
    /// scored by cosine similarity descending.
    async fn query_nearest(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &VectorFilter,
    ) -> Result<Vec<VectorMatch>, VectorStoreError>;

    /// Remove the vector for one user (account-deletion cascade).
    async fn delete(&self, user_id: UserId) -> Result<(), VectorStoreError>;
}

/// Fixture implementation for tests that never reach the vector store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVectorStore;

#[async_trait]
impl VectorStore for FixtureVectorStore {
    async fn upsert(
        &self,
        _values: &[f32],
        _metadata: &VectorMetadata,
    ) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn fetch(&self, _user_id: UserId) -> Result<Option<Vec<f32>>, VectorStoreError> {
        Ok(None)
    }

    async fn query_nearest(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _filter: &VectorFilter,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _user_id: UserId) -> Result<(), VectorStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn metadata(user_id: UserId) -> VectorMetadata {
        VectorMetadata {
            user_id,
            archetype: None,
            style: None,
            city: None,
            subscription_tier: SubscriptionTier::Free,
            last_active: Utc::now().to_rfc3339(),
            age_range: None,
        }
    }

    #[test]
    fn filter_excludes_only_the_named_user() {
        let excluded = UserId::random();
        let other = UserId::random();
        let filter = VectorFilter::excluding_user(excluded);

        assert!(!filter.matches(&metadata(excluded)));
        assert!(filter.matches(&metadata(other)));
        assert!(VectorFilter::default().matches(&metadata(excluded)));
    }
}
