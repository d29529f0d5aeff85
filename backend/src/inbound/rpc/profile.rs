//! Profile-facing RPC handlers: `get_me`, `update_profile`,
//! `complete_onboarding`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ports::{CacheKeys, CacheStore, ProfileRepository, TypedCache, UserRepository};
use crate::domain::{CoreResult, Error, ResonanceProfile, User, UserProfilePatch};

use super::AuthContext;

/// Field length bounds enforced at the boundary.
const DISPLAY_NAME_MIN: usize = 2;
const DISPLAY_NAME_MAX: usize = 50;
const BIO_MAX: usize = 500;
const PRONOUNS_MAX: usize = 20;

/// `get_me` response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithProfile {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ResonanceProfile>,
}

/// Profile RPC handler bundle.
pub struct ProfileRpc {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    cache: TypedCache,
    profile_ttl: Duration,
}

impl ProfileRpc {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        cache: Arc<dyn CacheStore>,
        profile_ttl: Duration,
    ) -> Self {
        Self {
            users,
            profiles,
            cache: TypedCache::new(cache),
            profile_ttl,
        }
    }

    /// The caller's user row plus resonance profile, when one exists.
    ///
    /// The profile projection is cached under the user's key space, so a
    /// rebuild's pattern invalidation refreshes it.
    pub async fn get_me(&self, ctx: &AuthContext) -> CoreResult<UserWithProfile> {
        let user_id = ctx.require_user()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
            .ok_or_else(|| Error::not_found("account no longer exists"))?;

        let profile_key = CacheKeys::profile(user_id);
        let profile = match self
            .cache
            .get::<ResonanceProfile>(&profile_key)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
        {
            Some(cached) => Some(cached),
            None => {
                let profile = self
                    .profiles
                    .find_by_user_id(user_id)
                    .await
                    .map_err(|error| Error::internal(error.to_string()))?;
                if let Some(profile) = &profile {
                    self.cache
                        .set(&profile_key, profile, Some(self.profile_ttl))
                        .await
                        .map_err(|error| Error::internal(error.to_string()))?;
                }
                profile
            }
        };

        Ok(UserWithProfile { user, profile })
    }

    /// Apply a validated profile patch. No side effects on validation
    /// failure.
    pub async fn update_profile(
        &self,
        ctx: &AuthContext,
        patch: UserProfilePatch,
    ) -> CoreResult<()> {
        let user_id = ctx.require_user()?;
        validate_patch(&patch)?;
        if patch.is_empty() {
            return Ok(());
        }

        self.users
            .apply_profile_patch(user_id, &patch)
            .await
            .map_err(|error| Error::internal(error.to_string()))
    }

    /// Flag onboarding as complete, unlocking profile building.
    pub async fn complete_onboarding(&self, ctx: &AuthContext) -> CoreResult<()> {
        let user_id = ctx.require_user()?;
        self.users
            .mark_onboarded(user_id)
            .await
            .map_err(|error| Error::internal(error.to_string()))
    }
}

fn validate_patch(patch: &UserProfilePatch) -> CoreResult<()> {
    if let Some(display_name) = patch.display_name.as_deref() {
        let length = display_name.trim().chars().count();
        if !(DISPLAY_NAME_MIN..=DISPLAY_NAME_MAX).contains(&length) {
            return Err(Error::invalid_request(format!(
                "display name must be between {DISPLAY_NAME_MIN} and {DISPLAY_NAME_MAX} characters"
            )));
        }
    }
    if let Some(bio) = patch.bio.as_deref() {
        if bio.chars().count() > BIO_MAX {
            return Err(Error::invalid_request(format!(
                "bio must be at most {BIO_MAX} characters"
            )));
        }
    }
    if let Some(pronouns) = patch.pronouns.as_deref() {
        if pronouns.chars().count() > PRONOUNS_MAX {
            return Err(Error::invalid_request(format!(
                "pronouns must be at most {PRONOUNS_MAX} characters"
            )));
        }
    }
    Ok(())
}
