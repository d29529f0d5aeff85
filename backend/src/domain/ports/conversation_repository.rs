//! Port for conversation persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Conversation, ConversationId, HealthState, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by conversation repository adapters.
    pub enum ConversationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "conversation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "conversation repository query failed: {message}",
    }
}

/// Nudge text attached alongside a health-state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct NudgeUpdate {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// Port for conversation rows and their health metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Fetch one conversation.
    async fn find_by_id(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;

    /// Conversations whose last message arrived at or after `cutoff`.
    async fn list_with_messages_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError>;

    /// Both participants of the conversation, resolved through its match,
    /// in canonical pair order.
    async fn participants(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<(UserId, UserId)>, ConversationRepositoryError>;

    /// Persist a health-state transition, setting the pending nudge when
    /// one was generated.
    async fn update_health(
        &self,
        conversation_id: ConversationId,
        state: HealthState,
        nudge: Option<NudgeUpdate>,
    ) -> Result<(), ConversationRepositoryError>;
}

/// Fixture implementation for tests that never touch conversations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureConversationRepository;

#[async_trait]
impl ConversationRepository for FixtureConversationRepository {
    async fn find_by_id(
        &self,
        _conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        Ok(None)
    }

    async fn list_with_messages_since(
        &self,
        _cutoff: DateTime<Utc>,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        Ok(Vec::new())
    }

    async fn participants(
        &self,
        _conversation_id: ConversationId,
    ) -> Result<Option<(UserId, UserId)>, ConversationRepositoryError> {
        Ok(None)
    }

    async fn update_health(
        &self,
        _conversation_id: ConversationId,
        _state: HealthState,
        _nudge: Option<NudgeUpdate>,
    ) -> Result<(), ConversationRepositoryError> {
        Ok(())
    }
}
