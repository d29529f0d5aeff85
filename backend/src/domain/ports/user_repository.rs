//! Port for user-row persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{User, UserId, UserProfilePatch};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
    }
}

/// Port for reading and mutating user rows.
///
/// The core never creates users; the external auth flow owns creation. The
/// mutations here are limited to profile-editable fields and lifecycle
/// markers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch one user by id, including soft-deleted rows.
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Batch-fetch users by id. Missing ids are silently absent from the
    /// result.
    async fn find_many(&self, user_ids: &[UserId]) -> Result<Vec<User>, UserRepositoryError>;

    /// Users active since `cutoff` that are onboarded and not deleted,
    /// bounded to `limit` rows.
    async fn find_active_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<User>, UserRepositoryError>;

    /// Apply a profile patch to the user row.
    async fn apply_profile_patch(
        &self,
        user_id: UserId,
        patch: &UserProfilePatch,
    ) -> Result<(), UserRepositoryError>;

    /// Flag onboarding as complete.
    async fn mark_onboarded(&self, user_id: UserId) -> Result<(), UserRepositoryError>;

    /// Record activity by bumping `last_active_at`.
    async fn touch_last_active(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError>;
}

/// Fixture implementation for tests that never hit the user store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_many(&self, _user_ids: &[UserId]) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_active_since(
        &self,
        _cutoff: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }

    async fn apply_profile_patch(
        &self,
        _user_id: UserId,
        _patch: &UserProfilePatch,
    ) -> Result<(), UserRepositoryError> {
        Ok(())
    }

    async fn mark_onboarded(&self, _user_id: UserId) -> Result<(), UserRepositoryError> {
        Ok(())
    }

    async fn touch_last_active(
        &self,
        _user_id: UserId,
        _at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        Ok(())
    }
}
