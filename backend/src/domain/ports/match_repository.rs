//! Port for match-pair reads.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{Match, MatchId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by match repository adapters.
    pub enum MatchRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "match repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "match repository query failed: {message}",
    }
}

/// Port for match pairs.
///
/// The store enforces uniqueness on the canonical ordered pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Fetch one match.
    async fn find_by_id(&self, match_id: MatchId) -> Result<Option<Match>, MatchRepositoryError>;

    /// The user's most recent matches, newest first, bounded to `limit`.
    async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Match>, MatchRepositoryError>;

    /// Batched variant of [`Self::recent_for_user`] covering many users in
    /// one round trip. Users with no matches map to an empty list.
    async fn recent_for_users(
        &self,
        user_ids: &[UserId],
        per_user_limit: usize,
    ) -> Result<HashMap<UserId, Vec<Match>>, MatchRepositoryError>;
}

/// Fixture implementation for tests that never read matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMatchRepository;

#[async_trait]
impl MatchRepository for FixtureMatchRepository {
    async fn find_by_id(&self, _match_id: MatchId) -> Result<Option<Match>, MatchRepositoryError> {
        Ok(None)
    }

    async fn recent_for_user(
        &self,
        _user_id: UserId,
        _limit: usize,
    ) -> Result<Vec<Match>, MatchRepositoryError> {
        Ok(Vec::new())
    }

    async fn recent_for_users(
        &self,
        _user_ids: &[UserId],
        _per_user_limit: usize,
    ) -> Result<HashMap<UserId, Vec<Match>>, MatchRepositoryError> {
        Ok(HashMap::new())
    }
}
