//! Account-deletion cascade for core-owned artifacts.
//!
//! The relational layer cascades its own foreign keys; this handler removes
//! what lives outside it: the semantic vector, the profile row, and every
//! cached artifact for the user.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ports::{CacheStore, ProfileRepository, TypedCache, VectorStore};
use crate::domain::{CoreResult, UserId};

use super::internal;

/// Payload of the `resonate/account-deleted` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDeletedEvent {
    pub user_id: UserId,
    pub email: String,
}

/// Deletion cleanup handler.
pub struct AccountCleanupJob {
    vectors: Arc<dyn VectorStore>,
    profiles: Arc<dyn ProfileRepository>,
    cache: TypedCache,
}

impl AccountCleanupJob {
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        profiles: Arc<dyn ProfileRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            vectors,
            profiles,
            cache: TypedCache::new(cache),
        }
    }

    /// Remove everything the core derived for the deleted account.
    pub async fn handle(&self, event: AccountDeletedEvent) -> CoreResult<()> {
        self.vectors
            .delete(event.user_id)
            .await
            .map_err(internal)?;
        self.profiles
            .delete(event.user_id)
            .await
            .map_err(internal)?;
        let removed = self
            .cache
            .invalidate_user(event.user_id)
            .await
            .map_err(internal)?;

        info!(user_id = %event.user_id, cached_removed = removed, "account artifacts removed");
        Ok(())
    }
}
