//! Emotional resonance scoring for a pair of users.
//!
//! Five weighted components produce a base score in `[0, 100]`; four
//! multiplicative modifiers shade it by geography, recency, and profile
//! completeness. Results are cached per sorted pair and invalidated
//! transitively when either profile is rebuilt.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{CacheKeys, CacheStore, ProfileRepository, TypedCache, UserRepository};
use crate::domain::{CoreResult, Error, PEAK_HOUR_SLOTS, ResonanceProfile, User, UserId};

mod geo;
mod matrices;
mod waveform;

pub use geo::haversine_km;
pub use matrices::{archetype_affinity, style_compatibility};
pub use waveform::{WAVEFORM_BINS, WaveformPayload, WaveformSide, synthesize};

/// Component weights; they sum to 100.
const WEIGHT_VECTOR: f64 = 30.0;
const WEIGHT_CHRONO: f64 = 15.0;
const WEIGHT_STYLE: f64 = 20.0;
const WEIGHT_DEPTH: f64 = 15.0;
const WEIGHT_ARCHETYPE: f64 = 20.0;

/// Neutral stand-in when no ANN similarity was provided.
const DEFAULT_VECTOR_SIMILARITY: f64 = 0.5;

/// Cosine similarity of two equal-length vectors; 0 for degenerate inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Chronobiological overlap: per-hour `min` summed over per-hour `max`.
///
/// Neutral 0.5 when either schedule is entirely empty.
pub fn chrono_overlap(a: &[f64; PEAK_HOUR_SLOTS], b: &[f64; PEAK_HOUR_SLOTS]) -> f64 {
    let a_empty = a.iter().all(|slot| *slot == 0.0);
    let b_empty = b.iter().all(|slot| *slot == 0.0);
    if a_empty || b_empty {
        return 0.5;
    }

    let mut min_sum = 0.0;
    let mut max_sum = 0.0;
    for (x, y) in a.iter().zip(b) {
        min_sum += x.min(*y);
        max_sum += x.max(*y);
    }
    if max_sum == 0.0 { 0.5 } else { min_sum / max_sum }
}

/// Depth alignment: perfect at equal depths, zero at a gap of one half.
pub fn depth_alignment(a: f64, b: f64) -> f64 {
    (1.0 - 2.0 * (a - b).abs()).max(0.0)
}

/// Per-component breakdown surfaced alongside the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub vector_similarity: f64,
    pub chrono_overlap: f64,
    pub style_compatibility: f64,
    pub depth_alignment: f64,
    pub archetype_affinity: f64,
    pub base_score: f64,
    pub geographic_modifier: f64,
    pub recency_modifier: f64,
    pub completeness_modifier: f64,
    pub mutual_interest_modifier: f64,
}

/// A scored pair with its visualization payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResonanceScore {
    /// Bounded total in `[0, 100]`.
    pub total: u8,
    pub breakdown: ScoreBreakdown,
    pub waveform: WaveformPayload,
}

/// User row plus profile for one side of a scoring.
#[derive(Debug, Clone)]
pub struct ResonanceContext {
    pub user: User,
    pub profile: ResonanceProfile,
}

/// Pure scoring over two loaded contexts.
pub fn compute_score(
    a: &ResonanceContext,
    b: &ResonanceContext,
    vector_similarity: Option<f64>,
    now: chrono::DateTime<chrono::Utc>,
) -> ResonanceScore {
    let vector = vector_similarity.unwrap_or(DEFAULT_VECTOR_SIMILARITY);
    let chrono = chrono_overlap(&a.profile.peak_hours, &b.profile.peak_hours);
    let style = style_compatibility(a.profile.communication_style, b.profile.communication_style);
    let depth = depth_alignment(a.profile.depth_score, b.profile.depth_score);
    let archetype = archetype_affinity(a.profile.archetype, b.profile.archetype);

    let base_score = vector * WEIGHT_VECTOR
        + chrono * WEIGHT_CHRONO
        + style * WEIGHT_STYLE
        + depth * WEIGHT_DEPTH
        + archetype * WEIGHT_ARCHETYPE;

    let geographic = geographic_modifier(&a.user, &b.user);
    let recency = recency_modifier(&a.user, &b.user, now);
    let completeness = if a.profile.archetype.is_none() || b.profile.archetype.is_none() {
        0.5
    } else {
        1.0
    };
    // Reserved for a future match-history signal.
    let mutual = 1.0;

    let total = (base_score * geographic * recency * completeness * mutual)
        .clamp(0.0, 100.0)
        .round() as u8;

    let waveform = synthesize(
        WaveformSide {
            user_id: a.user.id,
            archetype: a.profile.archetype,
            depth_score: a.profile.depth_score,
        },
        WaveformSide {
            user_id: b.user.id,
            archetype: b.profile.archetype,
            depth_score: b.profile.depth_score,
        },
    );

    ResonanceScore {
        total,
        breakdown: ScoreBreakdown {
            vector_similarity: vector,
            chrono_overlap: chrono,
            style_compatibility: style,
            depth_alignment: depth,
            archetype_affinity: archetype,
            base_score,
            geographic_modifier: geographic,
            recency_modifier: recency,
            completeness_modifier: completeness,
            mutual_interest_modifier: mutual,
        },
        waveform,
    }
}

/// Distance shading: neutral inside 50 km, linear decay to a 0.7 floor.
/// Unknown locations read as neutral.
fn geographic_modifier(a: &User, b: &User) -> f64 {
    let (Some(loc_a), Some(loc_b)) = (a.location, b.location) else {
        return 1.0;
    };
    let distance = haversine_km(loc_a, loc_b);
    if distance <= 50.0 {
        1.0
    } else {
        (0.95 - (distance - 50.0) * 0.000_5).max(0.7)
    }
}

/// Staleness shading keyed on the lazier participant.
fn recency_modifier(a: &User, b: &User, now: chrono::DateTime<chrono::Utc>) -> f64 {
    let stalest = a.days_since_active(now).max(b.days_since_active(now));
    if stalest <= 3.0 {
        1.0
    } else if stalest <= 7.0 {
        1.0 - (stalest - 3.0) * 0.05
    } else {
        (0.8 - (stalest - 7.0) * 0.03).max(0.6)
    }
}

/// Pairwise scoring engine with per-pair result caching.
pub struct ResonanceEngine {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    cache: TypedCache,
    clock: Arc<dyn Clock>,
    score_ttl: Duration,
}

impl ResonanceEngine {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        score_ttl: Duration,
    ) -> Self {
        Self {
            users,
            profiles,
            cache: TypedCache::new(cache),
            clock,
            score_ttl,
        }
    }

    /// Score a pair, consulting the pair cache first.
    ///
    /// `vector_similarity` lets the feed pipeline reuse the ANN score
    /// instead of refetching vectors. Raises NotFound when either user or
    /// either profile is missing.
    pub async fn score_pair(
        &self,
        a: UserId,
        b: UserId,
        vector_similarity: Option<f64>,
    ) -> CoreResult<ResonanceScore> {
        let key = CacheKeys::resonance_score(a, b);
        if let Some(cached) = self
            .cache
            .get::<ResonanceScore>(&key)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
        {
            debug!(%a, %b, "resonance score served from cache");
            return Ok(cached);
        }

        let (ctx_a, ctx_b) = tokio::join!(self.load_context(a), self.load_context(b));
        let score = compute_score(&ctx_a?, &ctx_b?, vector_similarity, self.clock.utc());

        self.cache
            .set(&key, &score, Some(self.score_ttl))
            .await
            .map_err(|error| Error::internal(error.to_string()))?;
        Ok(score)
    }

    /// Load one side's user row and profile concurrently.
    async fn load_context(&self, user_id: UserId) -> CoreResult<ResonanceContext> {
        let (user, profile) = tokio::join!(
            self.users.find_by_id(user_id),
            self.profiles.find_by_user_id(user_id)
        );

        let user = user
            .map_err(|error| Error::internal(error.to_string()))?
            .ok_or_else(|| Error::not_found(format!("user {user_id} does not exist")))?;
        let profile = profile
            .map_err(|error| Error::internal(error.to_string()))?
            .ok_or_else(|| Error::not_found(format!("no resonance profile for user {user_id}")))?;

        Ok(ResonanceContext { user, profile })
    }
}
