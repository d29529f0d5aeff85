//! Resonance profile builder.
//!
//! Aggregates passive behavioural signals into a profile row plus a dense
//! semantic vector. The rebuild procedure is the sole writer of a user's
//! profile row and vector; racing rebuilds resolve last-write-wins.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    CacheStore, EmbeddingClient, EventRepository, MessageRepository, ProfileRepository,
    TypedCache, UserRepository, VectorMetadata, VectorStore,
};
use crate::domain::runtime::{SlidingWindowLimiter, with_deadline};
use crate::domain::signals::SignalBundles;
use crate::domain::{
    CoreResult, Error, EventType, ResonanceProfile, User, UserId,
    config::{IoDeadline, RebuildConfig},
};

mod aggregators;
mod classify;
mod prompt;

pub use aggregators::{
    MESSAGING_WINDOW, bio_signals, browsing_signals, messaging_signals, session_signals,
    typing_signals, voice_signals,
};
pub use classify::{
    Classification, classify, classify_archetype, classify_style, completeness, depth_score,
    dominant_emotions, humor_score, vocabulary_richness,
};
pub use prompt::embedding_prompt;

/// Version tag stamped on every rebuilt profile row.
pub const MODEL_VERSION: &str = "resonance-embed-001";

/// Upper bound on events fetched per source during a rebuild.
const EVENT_WINDOW: usize = 2_000;

/// Port bundle required by the profile builder.
pub struct ProfileBuilderPorts {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub events: Arc<dyn EventRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub vectors: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn EmbeddingClient>,
    pub cache: Arc<dyn CacheStore>,
}

/// Profile rebuild orchestrator.
pub struct ProfileBuilder {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    events: Arc<dyn EventRepository>,
    messages: Arc<dyn MessageRepository>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingClient>,
    cache: TypedCache,
    limiter: Arc<SlidingWindowLimiter>,
    clock: Arc<dyn Clock>,
    config: RebuildConfig,
    deadline: IoDeadline,
}

impl ProfileBuilder {
    pub fn new(
        ports: ProfileBuilderPorts,
        limiter: Arc<SlidingWindowLimiter>,
        clock: Arc<dyn Clock>,
        config: RebuildConfig,
        deadline: IoDeadline,
    ) -> Self {
        Self {
            users: ports.users,
            profiles: ports.profiles,
            events: ports.events,
            messages: ports.messages,
            vectors: ports.vectors,
            embedder: ports.embedder,
            cache: TypedCache::new(ports.cache),
            limiter,
            clock,
            config,
            deadline,
        }
    }

    /// Rebuild one user's profile end to end.
    ///
    /// Sequence: gather signals concurrently, classify, embed, upsert the
    /// vector, commit the profile row, then invalidate the user's cached
    /// artifacts. The cache invalidation happens strictly after the row
    /// commit so stale consumers cannot read pre-commit state.
    pub async fn rebuild(&self, user_id: UserId) -> CoreResult<ResonanceProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
            .ok_or_else(|| Error::not_found(format!("user {user_id} does not exist")))?;

        if !user.is_active_record() {
            return Err(Error::invalid_request("cannot rebuild a deleted account"));
        }
        if !user.onboarding_completed {
            return Err(Error::invalid_request(
                "profiles exist only for onboarded users",
            ));
        }

        let bundles = self.gather_signals(&user).await?;
        let outcome = classify(&bundles);
        let now = self.clock.utc();

        let mut profile = ResonanceProfile {
            user_id,
            archetype: Some(outcome.archetype),
            communication_style: Some(outcome.style),
            dominant_emotions: outcome.dominant_emotions.clone(),
            peak_hours: outcome.peak_hours,
            vocabulary_richness: outcome.vocabulary_richness,
            humor_score: outcome.humor_score,
            depth_score: outcome.depth_score,
            completeness: outcome.completeness,
            embedding_generated: false,
            recalculated_at: now,
            model_version: MODEL_VERSION.to_owned(),
        };

        profile.embedding_generated = self
            .generate_and_store_vector(&user, &bundles, &outcome)
            .await;

        self.profiles
            .upsert(&profile)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;

        match self.cache.invalidate_user(user_id).await {
            Ok(removed) => debug!(%user_id, removed, "invalidated cached artifacts after rebuild"),
            Err(error) => warn!(%user_id, %error, "cache invalidation failed after rebuild"),
        }

        Ok(profile)
    }

    /// Run the six aggregators concurrently, one fetch per data source.
    async fn gather_signals(&self, user: &User) -> CoreResult<SignalBundles> {
        let voice_fut = async {
            let latest = self
                .events
                .latest_of_type(user.id, &EventType::VoiceNoteAnalyzed)
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
            Ok::<_, Error>(voice_signals(user, latest.as_ref()))
        };
        let bio_fut = async {
            let edits = self
                .events
                .list_for_user(user.id, &[EventType::BioEdited], EVENT_WINDOW)
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
            Ok::<_, Error>(bio_signals(user, edits.len()))
        };
        let messaging_fut = async {
            let messages = self
                .messages
                .recent_by_sender(user.id, MESSAGING_WINDOW)
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
            Ok::<_, Error>(messaging_signals(&messages))
        };
        let typing_fut = async {
            let events = self
                .events
                .list_for_user(
                    user.id,
                    &[EventType::TypingStarted, EventType::TypingStopped],
                    EVENT_WINDOW,
                )
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
            Ok::<_, Error>(typing_signals(&events))
        };
        let sessions_fut = async {
            let events = self
                .events
                .list_for_user(
                    user.id,
                    &[EventType::AppOpened, EventType::AppClosed],
                    EVENT_WINDOW,
                )
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
            Ok::<_, Error>(session_signals(&events))
        };
        let browsing_fut = async {
            let events = self
                .events
                .list_for_user(
                    user.id,
                    &[EventType::ProfileViewed, EventType::PhotoViewed],
                    EVENT_WINDOW,
                )
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
            Ok::<_, Error>(browsing_signals(&events))
        };

        let (voice, bio, messaging, typing, sessions, browsing) = tokio::join!(
            voice_fut,
            bio_fut,
            messaging_fut,
            typing_fut,
            sessions_fut,
            browsing_fut
        );

        Ok(SignalBundles {
            voice: voice?,
            bio: bio?,
            messaging: messaging?,
            typing: typing?,
            sessions: sessions?,
            browsing: browsing?,
        })
    }

    /// Embed the prompt and upsert the vector. Upstream failures are
    /// non-fatal: the profile row is still committed without a vector.
    async fn generate_and_store_vector(
        &self,
        user: &User,
        bundles: &SignalBundles,
        outcome: &Classification,
    ) -> bool {
        let prompt = embedding_prompt(user, bundles);

        self.limiter.acquire().await;
        let embedded = with_deadline(self.deadline.0, "embedding request", async {
            self.embedder
                .embed(&prompt)
                .await
                .map_err(|error| Error::upstream(error.to_string()))
        })
        .await;

        let response = match embedded {
            Ok(response) => response,
            Err(error) => {
                warn!(user_id = %user.id, %error, "embedding failed; committing partial profile");
                return false;
            }
        };

        let metadata = VectorMetadata {
            user_id: user.id,
            archetype: Some(outcome.archetype),
            style: Some(outcome.style),
            city: user.city.clone(),
            subscription_tier: user.subscription_tier,
            last_active: user.last_active_at.to_rfc3339(),
            age_range: None,
        };

        match self.vectors.upsert(&response.vector, &metadata).await {
            Ok(()) => {
                debug!(
                    user_id = %user.id,
                    prompt_tokens = response.prompt_tokens,
                    cost_usd = response.cost_usd,
                    "stored fresh semantic vector"
                );
                true
            }
            Err(error) => {
                warn!(user_id = %user.id, %error, "vector upsert failed; committing partial profile");
                false
            }
        }
    }

    /// Whether the daily pass should skip this user's existing profile.
    pub fn profile_is_fresh(&self, profile: &ResonanceProfile) -> bool {
        let age_seconds = profile.age_hours(self.clock.utc()) * 3_600.0;
        age_seconds < self.config.freshness_threshold.as_secs_f64()
    }

    pub fn config(&self) -> &RebuildConfig {
        &self.config
    }
}
