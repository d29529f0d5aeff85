//! Domain entities, ports, and the four engine services.
//!
//! Everything here is transport-free: inbound adapters (RPC handlers,
//! scheduled jobs) drive the services, and the services reach the outside
//! world only through the ports in [`ports`].

pub mod config;
pub mod conversation_health;
pub mod feed;
pub mod ports;
pub mod profile_builder;
pub mod resonance;
pub mod runtime;

pub mod conversation;
pub mod error;
pub mod events;
pub mod ids;
pub mod matching;
pub mod profile;
pub mod signals;
pub mod user;

pub use self::conversation::{Conversation, HealthState, Message, MessageContentType};
pub use self::error::{CoreResult, Error, ErrorCode};
pub use self::events::{
    BehavioralEvent, BioEditedPayload, EventType, SpeakingPace, VoiceAnalysisPayload,
};
pub use self::ids::{ConversationId, MatchId, SessionId, UserId, canonical_pair};
pub use self::matching::{BlockReport, Match, MatchState, SafetyRecordKind};
pub use self::profile::{
    CommunicationStyle, EnergyArchetype, PEAK_HOUR_SLOTS, ResonanceProfile,
};
pub use self::signals::{
    BioSignals, BioStyle, BrowsingSignals, MessagingSignals, SessionSignals, SignalBundles,
    TypingSignals, VoiceSignals,
};
pub use self::user::{GeoPoint, SubscriptionTier, User, UserProfilePatch};
