//! End-to-end cold-start rebuild over the public crate surface.
//!
//! Drives the profile builder with in-memory adapters and hand-rolled
//! repository doubles: a fresh user with a voice note and a four-word bio
//! should classify as a minimal spark, store a vector, and invalidate the
//! cached artifacts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use serde_json::json;

use resonate_backend::domain::config::{IoDeadline, RateLimitConfig, RebuildConfig};
use resonate_backend::domain::ports::{
    CacheKeys, CacheStore, EMBEDDING_DIMENSIONS, EmbeddingClient, EmbeddingResponse,
    EventRepository, EventRepositoryError, GenerativeClientError, MessageRepository,
    MessageRepositoryError, ProfileRepository, ProfileRepositoryError, UserRepository,
    UserRepositoryError, VectorStore,
};
use resonate_backend::domain::profile_builder::{ProfileBuilder, ProfileBuilderPorts};
use resonate_backend::domain::runtime::{SlidingWindowLimiter, TokioSleeper};
use resonate_backend::domain::{
    BehavioralEvent, CommunicationStyle, ConversationId, EnergyArchetype, EventType, Message,
    ResonanceProfile, SessionId, SubscriptionTier, User, UserId, UserProfilePatch,
};
use resonate_backend::outbound::memory::{MemoryCacheStore, MemoryVectorStore};

struct SingleUserRepository(User);

#[async_trait]
impl UserRepository for SingleUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok((self.0.id == user_id).then(|| self.0.clone()))
    }

    async fn find_many(&self, user_ids: &[UserId]) -> Result<Vec<User>, UserRepositoryError> {
        Ok(user_ids
            .iter()
            .filter(|id| **id == self.0.id)
            .map(|_| self.0.clone())
            .collect())
    }

    async fn find_active_since(
        &self,
        _cutoff: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<User>, UserRepositoryError> {
        Ok(vec![self.0.clone()])
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

#[derive(Default)]
struct RecordingProfileRepository(std::sync::Mutex<Option<ResonanceProfile>>);

#[async_trait]
impl ProfileRepository for RecordingProfileRepository {
    async fn find_by_user_id(
        &self,
        _user_id: UserId,
    ) -> Result<Option<ResonanceProfile>, ProfileRepositoryError> {
        Ok(self.0.lock().expect("profile mutex").clone())
    }

    async fn find_many(
        &self,
        _user_ids: &[UserId],
    ) -> Result<Vec<ResonanceProfile>, ProfileRepositoryError> {
        Ok(self.0.lock().expect("profile mutex").clone().into_iter().collect())
    }

    async fn upsert(&self, profile: &ResonanceProfile) -> Result<(), ProfileRepositoryError> {
        *self.0.lock().expect("profile mutex") = Some(profile.clone());
        Ok(())
    }

    async fn delete(&self, _user_id: UserId) -> Result<(), ProfileRepositoryError> {
        *self.0.lock().expect("profile mutex") = None;
        Ok(())
    }
}

struct VoiceEventRepository(BehavioralEvent);

#[async_trait]
impl EventRepository for VoiceEventRepository {
    async fn record_batch(
        &self,
        events: &[BehavioralEvent],
    ) -> Result<usize, EventRepositoryError> {
        Ok(events.len())
    }

    async fn latest_of_type(
        &self,
        _user_id: UserId,
        event_type: &EventType,
    ) -> Result<Option<BehavioralEvent>, EventRepositoryError> {
        Ok((*event_type == EventType::VoiceNoteAnalyzed).then(|| self.0.clone()))
    }

    async fn list_for_user(
        &self,
        _user_id: UserId,
        _event_types: &[EventType],
        _limit: usize,
    ) -> Result<Vec<BehavioralEvent>, EventRepositoryError> {
        Ok(Vec::new())
    }
}

struct NoMessages;

#[async_trait]
impl MessageRepository for NoMessages {
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

struct UnitEmbedder;

#[async_trait]
impl EmbeddingClient for UnitEmbedder {
    async fn embed(&self, _text: &str) -> Result<EmbeddingResponse, GenerativeClientError> {
        let mut vector = vec![0.0_f32; EMBEDDING_DIMENSIONS];
        vector[0] = 1.0;
        Ok(EmbeddingResponse {
            vector,
            prompt_tokens: 48,
            cost_usd: 0.000_1,
        })
    }
}

#[tokio::test]
async fn cold_start_builds_a_minimal_spark_profile() {
    let now = Utc::now();
    let user_id = UserId::random();
    let user = User {
        id: user_id,
        display_name: "Rowan".to_owned(),
        bio: Some("Sound engineer by day".to_owned()),
        pronouns: None,
        city: Some("Brooklyn".to_owned()),
        country: Some("US".to_owned()),
        location: None,
        voice_intro_url: Some("https://cdn/voice.ogg".to_owned()),
        subscription_tier: SubscriptionTier::Free,
        last_active_at: now,
        onboarding_completed: true,
        deleted_at: None,
        created_at: now,
    };
    let voice_event = BehavioralEvent {
        user_id,
        session_id: SessionId::random(),
        event_type: EventType::VoiceNoteAnalyzed,
        event_data: Some(json!({"speakingPace": "fast", "sentiment": 0.2})),
        client_ts: now,
        server_ts: now,
    };

    let clock = Arc::new(DefaultClock);
    let cache = Arc::new(MemoryCacheStore::new(clock.clone()));
    let vectors = Arc::new(MemoryVectorStore::new());
    let profiles = Arc::new(RecordingProfileRepository::default());

    // A stale cached artifact that the rebuild must clear.
    cache
        .set_raw(&CacheKeys::feed_ranked(user_id), "stale", None)
        .await
        .expect("seed cache");

    let builder = ProfileBuilder::new(
        ProfileBuilderPorts {
            users: Arc::new(SingleUserRepository(user)),
            profiles: profiles.clone(),
            events: Arc::new(VoiceEventRepository(voice_event)),
            messages: Arc::new(NoMessages),
            vectors: vectors.clone(),
            embedder: Arc::new(UnitEmbedder),
            cache: cache.clone(),
        },
        Arc::new(SlidingWindowLimiter::new(
            RateLimitConfig::default(),
            clock.clone(),
            Arc::new(TokioSleeper),
        )),
        clock,
        RebuildConfig::default(),
        IoDeadline::default(),
    );

    let profile = builder.rebuild(user_id).await.expect("rebuild succeeds");

    assert_eq!(profile.archetype, Some(EnergyArchetype::Spark));
    assert_eq!(
        profile.communication_style,
        Some(CommunicationStyle::Minimal)
    );
    assert_eq!(profile.depth_score, 0.5);
    assert_eq!(profile.completeness, 40.0);
    assert!(profile.embedding_generated);

    // The committed row matches the returned profile.
    let stored = profiles
        .find_by_user_id(user_id)
        .await
        .expect("lookup")
        .expect("stored profile");
    assert_eq!(stored, profile);

    // The vector landed in the store.
    let vector = vectors.fetch(user_id).await.expect("fetch").expect("vector");
    assert_eq!(vector.len(), EMBEDDING_DIMENSIONS);
    assert_eq!(vector[0], 1.0);

    // The stale cached artifact is gone.
    assert_eq!(
        cache
            .get_raw(&CacheKeys::feed_ranked(user_id))
            .await
            .expect("get"),
        None
    );
}
