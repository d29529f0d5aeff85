//! Port for message reads.

use async_trait::async_trait;

use crate::domain::{ConversationId, Message, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by message repository adapters.
    pub enum MessageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "message repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "message repository query failed: {message}",
    }
}

/// Port for reading message history.
///
/// All reads exclude soft-deleted messages and return rows ordered by sent
/// time descending (most recent first).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// The user's most recent sent messages across all conversations.
    async fn recent_by_sender(
        &self,
        sender_id: UserId,
        limit: usize,
    ) -> Result<Vec<Message>, MessageRepositoryError>;

    /// The conversation's most recent messages.
    async fn recent_in_conversation(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, MessageRepositoryError>;
}

/// Fixture implementation for tests that never read messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMessageRepository;

#[async_trait]
impl MessageRepository for FixtureMessageRepository {
    async fn recent_by_sender(
        &self,
        _sender_id: UserId,
        _limit: usize,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        Ok(Vec::new())
    }

    async fn recent_in_conversation(
        &self,
        _conversation_id: ConversationId,
        _limit: usize,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        Ok(Vec::new())
    }
}
