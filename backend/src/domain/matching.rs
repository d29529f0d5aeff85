//! Match pairs, block/report records, and waveform snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, UserId, canonical_pair};

/// Lifecycle of a match pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Pending,
    Matched,
    ConversationStarted,
    Dormant,
    Unmatched,
}

/// A pair of users, stored in canonical (sorted) order.
///
/// ## Invariants
/// - `(user_a_id, user_b_id)` is unique and sorted ascending; use
///   [`Match::new_pair`] to construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub user_a_id: UserId,
    pub user_b_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resonance_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<serde_json::Value>,
    pub state: MatchState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked_by_a_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked_by_b_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmatched_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Build a pending match with the pair in canonical order.
    pub fn new_pair(a: UserId, b: UserId, now: DateTime<Utc>) -> Self {
        let (user_a_id, user_b_id) = canonical_pair(a, b);
        Self {
            id: MatchId::random(),
            user_a_id,
            user_b_id,
            resonance_score: None,
            waveform: None,
            state: MatchState::Pending,
            liked_by_a_at: None,
            liked_by_b_at: None,
            matched_at: None,
            conversation_started_at: None,
            unmatched_by: None,
            created_at: now,
        }
    }

    /// The other participant, or `None` when `user` is not in the pair.
    pub fn counterpart(&self, user: UserId) -> Option<UserId> {
        if self.user_a_id == user {
            Some(self.user_b_id)
        } else if self.user_b_id == user {
            Some(self.user_a_id)
        } else {
            None
        }
    }

    /// A mutual match that never produced a first message.
    pub fn is_ghosted(&self) -> bool {
        self.matched_at.is_some() && self.conversation_started_at.is_none()
    }
}

/// Kind of a safety record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyRecordKind {
    Block,
    Report,
}

/// A block or report filed by one user against another.
///
/// Blocks are unique per ordered `(reporter, reported)` pair; the store
/// enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReport {
    pub reporter_id: UserId,
    pub reported_id: UserId,
    pub kind: SafetyRecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
