//! Messages and conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, MatchId, UserId};

/// Content type of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageContentType {
    #[default]
    Text,
    VoiceNote,
    Image,
}

/// A single message inside a conversation.
///
/// `sender_id` is optional because user deletion nullifies the sender while
/// keeping the message row. Sentiment and emotion arrive pre-computed from
/// the external analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    pub content: String,
    pub content_type: MessageContentType,
    /// Pre-computed sentiment in `[-1, 1]`, when analysed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_tag: Option<String>,
    pub sent_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Conversation vitality states tracked by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Warming,
    Active,
    Cooling,
    Dormant,
    Revived,
}

impl HealthState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warming => "warming",
            Self::Active => "active",
            Self::Cooling => "cooling",
            Self::Dormant => "dormant",
            Self::Revived => "revived",
        }
    }
}

/// One conversation per match.
///
/// ## Invariants
/// - At most one pending nudge at a time; the UI clears `pending_nudge` on
///   delivery.
/// - Initial health state is `warming`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub match_id: MatchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    pub health_state: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_nudge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nudge_generated_at: Option<DateTime<Utc>>,
    pub archived_by_a: bool,
    pub archived_by_b: bool,
}

impl Conversation {
    /// Whole days since the last message, relative to `now`.
    ///
    /// A conversation with no messages yet reads as infinitely stale so the
    /// starvation rule never resurrects it.
    pub fn days_since_last_message(&self, now: DateTime<Utc>) -> f64 {
        match self.last_message_at {
            Some(last) => (now - last).num_seconds().max(0) as f64 / 86_400.0,
            None => f64::INFINITY,
        }
    }
}
