//! Profile rebuild jobs: the daily cron pass and the voice-note cold start.

use std::sync::Arc;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::ports::{ProfileRepository, UserRepository};
use crate::domain::profile_builder::ProfileBuilder;
use crate::domain::runtime::Sleeper;
use crate::domain::{CoreResult, ErrorCode, UserId};

use super::{internal, with_retries};

/// Structured counts reported to the scheduler after a daily pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildSummary {
    pub rebuilt: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Payload of the `resonate/voice-note-uploaded` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceNoteUploadedEvent {
    pub user_id: UserId,
    pub audio_url: String,
}

/// Nightly batch: rebuild every active user's profile, skipping fresh ones.
pub struct DailyRebuildJob {
    builder: Arc<ProfileBuilder>,
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl DailyRebuildJob {
    pub fn new(
        builder: Arc<ProfileBuilder>,
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            builder,
            users,
            profiles,
            clock,
            sleeper,
        }
    }

    /// Run one daily pass. Per-user failures are swallowed and counted.
    pub async fn run(&self) -> CoreResult<RebuildSummary> {
        let config = *self.builder.config();
        let cutoff = self.clock.utc() - chrono::TimeDelta::days(config.active_window_days);
        let users = self
            .users
            .find_active_since(cutoff, config.daily_user_limit)
            .await
            .map_err(internal)?;

        let mut summary = RebuildSummary::default();
        for user in users {
            let existing = match self.profiles.find_by_user_id(user.id).await {
                Ok(profile) => profile,
                Err(error) => {
                    warn!(user_id = %user.id, %error, "profile lookup failed; skipping user");
                    summary.failed += 1;
                    continue;
                }
            };
            if existing.is_some_and(|profile| self.builder.profile_is_fresh(&profile)) {
                debug!(user_id = %user.id, "profile still fresh; skipping");
                summary.skipped += 1;
                continue;
            }

            let outcome = with_retries(
                config.daily_retries,
                &self.sleeper,
                "daily profile rebuild",
                || self.builder.rebuild(user.id),
            )
            .await;
            match outcome {
                Ok(_) => summary.rebuilt += 1,
                Err(error) if error.code() == ErrorCode::InvalidRequest => {
                    debug!(user_id = %user.id, %error, "user not eligible; skipping");
                    summary.skipped += 1;
                }
                Err(error) => {
                    warn!(user_id = %user.id, %error, "daily rebuild failed for user");
                    summary.failed += 1;
                }
            }
        }

        info!(
            rebuilt = summary.rebuilt,
            skipped = summary.skipped,
            failed = summary.failed,
            "daily profile rebuild finished"
        );
        Ok(summary)
    }
}

/// Cold-start handler for freshly analysed voice notes.
pub struct VoiceNoteRebuildJob {
    builder: Arc<ProfileBuilder>,
    sleeper: Arc<dyn Sleeper>,
}

impl VoiceNoteRebuildJob {
    pub fn new(builder: Arc<ProfileBuilder>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { builder, sleeper }
    }

    /// Rebuild the uploader's profile, retrying transient failures.
    pub async fn handle(&self, event: VoiceNoteUploadedEvent) -> CoreResult<()> {
        let retries = self.builder.config().voice_note_retries;
        with_retries(retries, &self.sleeper, "voice-note rebuild", || {
            self.builder.rebuild(event.user_id)
        })
        .await?;
        info!(user_id = %event.user_id, "cold-start rebuild finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{IoDeadline, RateLimitConfig, RebuildConfig};
    use crate::domain::ports::{
        FixtureEventRepository, FixtureMessageRepository, MockCacheStore, MockEmbeddingClient,
        MockProfileRepository, MockUserRepository, MockVectorStore,
    };
    use crate::domain::profile_builder::{MODEL_VERSION, ProfileBuilderPorts};
    use crate::domain::runtime::SlidingWindowLimiter;
    use crate::domain::{ResonanceProfile, SubscriptionTier, User};
    use crate::test_support::{ImmediateSleeper, MutableClock};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0)
                .single()
                .expect("valid instant"),
        ))
    }

    fn active_user(id: UserId, now: chrono::DateTime<Utc>) -> User {
        User {
            id,
            display_name: "Sage".to_owned(),
            bio: None,
            pronouns: None,
            city: None,
            country: None,
            location: None,
            voice_intro_url: None,
            subscription_tier: SubscriptionTier::Free,
            last_active_at: now - TimeDelta::hours(5),
            onboarding_completed: true,
            deleted_at: None,
            created_at: now - TimeDelta::days(60),
        }
    }

    fn builder(
        users: MockUserRepository,
        profiles: MockProfileRepository,
        clock: Arc<MutableClock>,
    ) -> Arc<ProfileBuilder> {
        let mut cache = MockCacheStore::new();
        cache.expect_scan_delete().returning(|_| Ok(0));
        let mut embedder = MockEmbeddingClient::new();
        embedder.expect_embed().returning(|_| {
            Err(crate::domain::ports::GenerativeClientError::upstream(
                "offline in tests",
            ))
        });
        let limiter = Arc::new(SlidingWindowLimiter::new(
            RateLimitConfig::default(),
            clock.clone(),
            Arc::new(ImmediateSleeper),
        ));
        Arc::new(ProfileBuilder::new(
            ProfileBuilderPorts {
                users: Arc::new(users),
                profiles: Arc::new(profiles),
                events: Arc::new(FixtureEventRepository),
                messages: Arc::new(FixtureMessageRepository),
                vectors: Arc::new(MockVectorStore::new()),
                embedder: Arc::new(embedder),
                cache: Arc::new(cache),
            },
            limiter,
            clock,
            RebuildConfig::default(),
            IoDeadline::default(),
        ))
    }

    #[tokio::test]
    async fn daily_pass_skips_fresh_rebuilds_stale_and_counts_failures() {
        let clock = clock();
        let now = clock.utc();
        let fresh_user = active_user(UserId::random(), now);
        let stale_user = active_user(UserId::random(), now);
        let gone_user = active_user(UserId::random(), now);
        let (fresh_id, stale_id, gone_id) = (fresh_user.id, stale_user.id, gone_user.id);

        // Listing repository for the batch driver.
        let mut listing_users = MockUserRepository::new();
        let roster = vec![fresh_user.clone(), stale_user.clone(), gone_user.clone()];
        listing_users
            .expect_find_active_since()
            .return_once(move |_, _| Ok(roster));

        let mut listing_profiles = MockProfileRepository::new();
        listing_profiles
            .expect_find_by_user_id()
            .returning(move |id| {
                if id == fresh_id {
                    let mut profile = ResonanceProfile::empty(id, now, MODEL_VERSION);
                    profile.recalculated_at = now - TimeDelta::hours(2);
                    Ok(Some(profile))
                } else if id == stale_id {
                    let mut profile = ResonanceProfile::empty(id, now, MODEL_VERSION);
                    profile.recalculated_at = now - TimeDelta::hours(72);
                    Ok(Some(profile))
                } else {
                    Ok(None)
                }
            });

        // Builder-side repositories: the stale user rebuilds, the gone user
        // has vanished from the user store.
        let mut builder_users = MockUserRepository::new();
        let stale_clone = stale_user.clone();
        builder_users.expect_find_by_id().returning(move |id| {
            if id == stale_id {
                Ok(Some(stale_clone.clone()))
            } else if id == gone_id {
                Ok(None)
            } else {
                panic!("unexpected rebuild for {id}");
            }
        });
        let mut builder_profiles = MockProfileRepository::new();
        builder_profiles
            .expect_upsert()
            .withf(move |profile| profile.user_id == stale_id)
            .times(1)
            .returning(|_| Ok(()));

        let job = DailyRebuildJob::new(
            builder(builder_users, builder_profiles, clock.clone()),
            Arc::new(listing_users),
            Arc::new(listing_profiles),
            clock,
            Arc::new(ImmediateSleeper),
        );

        let summary = job.run().await.expect("daily pass");
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rebuilt, 1);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn voice_note_handler_commits_even_when_embedding_is_down() {
        let clock = clock();
        let now = clock.utc();
        let user = active_user(UserId::random(), now);
        let user_id = user.id;

        let mut builder_users = MockUserRepository::new();
        builder_users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        let mut builder_profiles = MockProfileRepository::new();
        builder_profiles
            .expect_upsert()
            .withf(move |profile| profile.user_id == user_id && !profile.embedding_generated)
            .times(1)
            .returning(|_| Ok(()));

        let job = VoiceNoteRebuildJob::new(
            builder(builder_users, builder_profiles, clock),
            Arc::new(ImmediateSleeper),
        );

        job.handle(VoiceNoteUploadedEvent {
            user_id,
            audio_url: "https://cdn/voice.ogg".to_owned(),
        })
        .await
        .expect("partial profile still commits");
    }

    #[tokio::test]
    async fn missing_uploader_surfaces_not_found() {
        let clock = clock();
        let mut builder_users = MockUserRepository::new();
        builder_users.expect_find_by_id().returning(|_| Ok(None));

        let job = VoiceNoteRebuildJob::new(
            builder(builder_users, MockProfileRepository::new(), clock),
            Arc::new(ImmediateSleeper),
        );

        let error = job
            .handle(VoiceNoteUploadedEvent {
                user_id: UserId::random(),
                audio_url: "https://cdn/voice.ogg".to_owned(),
            })
            .await
            .expect_err("uploader vanished");
        assert_eq!(error.code(), crate::domain::ErrorCode::NotFound);
    }
}
