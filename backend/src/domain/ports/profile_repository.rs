//! Port for resonance-profile persistence.

use async_trait::async_trait;

use crate::domain::{ResonanceProfile, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "profile repository query failed: {message}",
    }
}

/// Port for resonance-profile rows.
///
/// The profile-rebuild procedure is the sole writer of a given user's row;
/// concurrent rebuilds resolve last-write-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile for one user.
    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<ResonanceProfile>, ProfileRepositoryError>;

    /// Batch-fetch profiles. Users without a profile are absent from the
    /// result.
    async fn find_many(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<ResonanceProfile>, ProfileRepositoryError>;

    /// Insert or replace the profile row.
    async fn upsert(&self, profile: &ResonanceProfile) -> Result<(), ProfileRepositoryError>;

    /// Delete the profile row (account-deletion cascade).
    async fn delete(&self, user_id: UserId) -> Result<(), ProfileRepositoryError>;
}

/// Fixture implementation for tests that never hit the profile store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileRepository;

#[async_trait]
impl ProfileRepository for FixtureProfileRepository {
    async fn find_by_user_id(
        &self,
        _user_id: UserId,
    ) -> Result<Option<ResonanceProfile>, ProfileRepositoryError> {
        Ok(None)
    }

    async fn find_many(
        &self,
        _user_ids: &[UserId],
    ) -> Result<Vec<ResonanceProfile>, ProfileRepositoryError> {
        Ok(Vec::new())
    }

    async fn upsert(&self, _profile: &ResonanceProfile) -> Result<(), ProfileRepositoryError> {
        Ok(())
    }

    async fn delete(&self, _user_id: UserId) -> Result<(), ProfileRepositoryError> {
        Ok(())
    }
}
