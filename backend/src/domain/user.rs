//! User data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Subscription tier granted by the (external) billing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Plus,
    Premium,
}

impl SubscriptionTier {
    /// Additive feed-score boost for paying subscribers.
    pub fn feed_boost(self) -> f64 {
        match self {
            Self::Premium => 0.10,
            Self::Plus => 0.05,
            Self::Free => 0.0,
        }
    }
}

/// Geographic point attached to a user, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Application user.
///
/// Created by the external auth flow; the core only reads users and mutates
/// the profile-editable fields plus the onboarding and deletion markers.
///
/// ## Invariants
/// - `deleted_at` set means the account is closed; the user never appears in
///   candidate retrieval or scheduled rebuilds.
/// - `onboarding_completed` gates profile building: a resonance profile
///   exists only for onboarded users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// URL of the recorded voice introduction, when one has been uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_intro_url: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub last_active_at: DateTime<Utc>,
    pub onboarding_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account is live and visible to the matching core.
    pub fn is_active_record(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whole days since the user was last active, relative to `now`.
    pub fn days_since_active(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.last_active_at).num_seconds().max(0) as f64;
        seconds / 86_400.0
    }

    /// Hours since the user was last active, relative to `now`.
    pub fn hours_since_active(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.last_active_at).num_seconds().max(0) as f64;
        seconds / 3_600.0
    }
}

/// Patch applied by the profile-editing RPC.
///
/// Only fields present in the patch are written; validation happens at the
/// RPC boundary before the repository is touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl UserProfilePatch {
    /// Whether the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.pronouns.is_none()
            && self.city.is_none()
            && self.country.is_none()
    }
}
