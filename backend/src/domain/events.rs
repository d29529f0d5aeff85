//! Behavioural event records and their typed payload schemas.
//!
//! `event_data` is an open JSON shape on the wire. Each recognized event type
//! has a schema validated on read; unknown types are preserved verbatim and
//! ignored by the signal aggregators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{SessionId, UserId};

/// Event categories recognized by the core aggregators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    VoiceNoteAnalyzed,
    BioEdited,
    TypingStarted,
    TypingStopped,
    AppOpened,
    AppClosed,
    ProfileViewed,
    PhotoViewed,
    /// Unrecognized event type, preserved verbatim.
    #[serde(untagged)]
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::VoiceNoteAnalyzed => "voice_note_analyzed",
            Self::BioEdited => "bio_edited",
            Self::TypingStarted => "typing_started",
            Self::TypingStopped => "typing_stopped",
            Self::AppOpened => "app_opened",
            Self::AppClosed => "app_closed",
            Self::ProfileViewed => "profile_viewed",
            Self::PhotoViewed => "photo_viewed",
            Self::Other(name) => name.as_str(),
        }
    }
}

/// Immutable append-only behavioural event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralEvent {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
    pub client_ts: DateTime<Utc>,
    pub server_ts: DateTime<Utc>,
}

impl BehavioralEvent {
    /// Parse the payload against `T`'s schema, tolerating absent or
    /// malformed data by returning `None`.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        let data = self.event_data.as_ref()?;
        match serde_json::from_value(data.clone()) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                tracing::debug!(
                    event_type = self.event_type.as_str(),
                    %error,
                    "event payload failed schema validation"
                );
                None
            }
        }
    }
}

/// Speaking pace reported by the (external) voice analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingPace {
    Fast,
    #[default]
    Moderate,
    Slow,
}

/// Payload schema for `voice_note_analyzed` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceAnalysisPayload {
    pub transcript_word_count: u32,
    /// Unique-over-total token ratio in `[0, 1]`.
    pub vocabulary_richness: f64,
    /// Sentiment in `[-1, 1]`.
    pub sentiment: f64,
    pub dominant_emotions: Vec<String>,
    pub speaking_pace: SpeakingPace,
}

/// Payload schema for `bio_edited` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BioEditedPayload {
    pub previous_length: Option<u32>,
    pub new_length: Option<u32>,
}
