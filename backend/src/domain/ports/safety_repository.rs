//! Port for block/report reads used by safety filtering.

use async_trait::async_trait;

use crate::domain::{BlockReport, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by safety repository adapters.
    pub enum SafetyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "safety repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "safety repository query failed: {message}",
    }
}

/// Port for block and report records.
///
/// The feed pipeline only consumes these records; filing them is owned by
/// the external moderation surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SafetyRepository: Send + Sync {
    /// All records where the user is reporter or reported, either direction.
    async fn records_involving(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BlockReport>, SafetyRepositoryError>;
}

/// Fixture implementation for tests without safety records.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSafetyRepository;

#[async_trait]
impl SafetyRepository for FixtureSafetyRepository {
    async fn records_involving(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<BlockReport>, SafetyRepositoryError> {
        Ok(Vec::new())
    }
}
