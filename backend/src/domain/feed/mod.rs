//! Dynamic feed ranking pipeline.
//!
//! Five stages per viewer: candidate retrieval, safety filtering, soft
//! scoring, diversity injection, and paginated caching. The pipeline is
//! stateless; all derived state lives in the cache with a short TTL.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::ports::{
    CacheKeys, CacheStore, MatchRepository, ProfileRepository, SafetyRepository, TypedCache,
    UserRepository, VectorFilter, VectorStore,
};
use crate::domain::resonance::{ResonanceEngine, WaveformPayload};
use crate::domain::{
    CoreResult, EnergyArchetype, Error, User, UserId, config::FeedConfig,
};

mod diversity;
mod scoring;

pub use diversity::{DIVERSITY_BONUS, inject_diversity};
pub use scoring::{blend, freshness, ghost_penalty};

/// Recent-match window consulted for the ghost penalty.
const GHOST_MATCH_WINDOW: usize = 20;

/// One ranked feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub user_id: UserId,
    pub vector_score: f64,
    pub final_score: f64,
    pub archetype: Option<EnergyArchetype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resonance_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<WaveformPayload>,
    pub diversity_bonus: f64,
}

/// Pipeline observability counters surfaced with every page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDebugSummary {
    pub retrieved: usize,
    pub after_safety: usize,
    pub archetype_histogram: HashMap<String, usize>,
}

/// One emitted feed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub profiles: Vec<FeedEntry>,
    /// Next page cursor; `None` when the ranking is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub total: usize,
    pub debug: FeedDebugSummary,
}

impl FeedPage {
    fn empty() -> Self {
        Self {
            profiles: Vec::new(),
            cursor: None,
            total: 0,
            debug: FeedDebugSummary::default(),
        }
    }
}

/// Cached full ranking shared by all pages of one viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedFeed {
    entries: Vec<FeedEntry>,
    debug: FeedDebugSummary,
}

/// Unsafety sets assembled during stage two.
#[derive(Debug, Default)]
struct ExclusionSet {
    users: HashSet<UserId>,
}

impl ExclusionSet {
    fn absorb_members(&mut self, members: Vec<String>) {
        for member in members {
            match uuid::Uuid::from_str(&member) {
                Ok(id) => {
                    self.users.insert(UserId::from_uuid(id));
                }
                Err(_) => debug!(member, "ignoring malformed cached set member"),
            }
        }
    }
}

/// Port bundle required by the feed ranker.
pub struct FeedRankerPorts {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub matches: Arc<dyn MatchRepository>,
    pub safety: Arc<dyn SafetyRepository>,
    pub vectors: Arc<dyn VectorStore>,
    pub cache: Arc<dyn CacheStore>,
}

/// The five-stage feed ranking engine.
pub struct FeedRanker {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    matches: Arc<dyn MatchRepository>,
    safety: Arc<dyn SafetyRepository>,
    vectors: Arc<dyn VectorStore>,
    cache_raw: Arc<dyn CacheStore>,
    cache: TypedCache,
    resonance: Arc<ResonanceEngine>,
    clock: Arc<dyn Clock>,
    config: FeedConfig,
    feed_ttl: Duration,
}

impl FeedRanker {
    pub fn new(
        ports: FeedRankerPorts,
        resonance: Arc<ResonanceEngine>,
        clock: Arc<dyn Clock>,
        config: FeedConfig,
        feed_ttl: Duration,
    ) -> Self {
        let cache = TypedCache::new(ports.cache.clone());
        Self {
            users: ports.users,
            profiles: ports.profiles,
            matches: ports.matches,
            safety: ports.safety,
            vectors: ports.vectors,
            cache_raw: ports.cache,
            cache,
            resonance,
            clock,
            config,
            feed_ttl,
        }
    }

    /// Materialize one page of the viewer's discovery feed.
    pub async fn discover(
        &self,
        viewer_id: UserId,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> CoreResult<FeedPage> {
        let limit = limit
            .unwrap_or(self.config.page_size)
            .clamp(1, self.config.max_page_size);
        let page_index: usize = match cursor {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::invalid_request(format!("malformed feed cursor: {raw}")))?,
            None => 0,
        };

        let page_key = CacheKeys::feed_page(viewer_id, &page_index.to_string());
        if let Some(page) = self
            .cache
            .get::<FeedPage>(&page_key)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
        {
            debug!(%viewer_id, page_index, "feed page served from cache");
            return Ok(page);
        }

        let ranked = match self.load_or_rank(viewer_id).await? {
            Some(ranked) => ranked,
            None => return Ok(FeedPage::empty()),
        };

        let page = self.paginate(&ranked, page_index, limit);
        self.cache
            .set(&page_key, &page, Some(self.feed_ttl))
            .await
            .map_err(|error| Error::internal(error.to_string()))?;
        Ok(page)
    }

    /// Fetch the cached ranking or run stages one to three.
    async fn load_or_rank(&self, viewer_id: UserId) -> CoreResult<Option<RankedFeed>> {
        let ranked_key = CacheKeys::feed_ranked(viewer_id);
        if let Some(ranked) = self
            .cache
            .get::<RankedFeed>(&ranked_key)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
        {
            return Ok(Some(ranked));
        }

        let viewer_profile = self
            .profiles
            .find_by_user_id(viewer_id)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;
        if viewer_profile.is_none() {
            debug!(%viewer_id, "viewer has no profile; returning empty feed");
            return Ok(None);
        }

        let candidates = self.retrieve_candidates(viewer_id).await?;
        let retrieved = candidates.len();

        let excluded = self.exclusions(viewer_id).await?;
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !excluded.users.contains(&candidate.user_id))
            .collect();
        let after_safety = candidates.len();

        let entries = self.score_candidates(viewer_id, candidates).await?;
        let mut histogram: HashMap<String, usize> = HashMap::new();
        for entry in &entries {
            let bucket = entry
                .archetype
                .map_or("unclassified", EnergyArchetype::as_str);
            *histogram.entry(bucket.to_owned()).or_default() += 1;
        }

        let ranked = RankedFeed {
            entries,
            debug: FeedDebugSummary {
                retrieved,
                after_safety,
                archetype_histogram: histogram,
            },
        };
        self.cache
            .set(&ranked_key, &ranked, Some(self.feed_ttl))
            .await
            .map_err(|error| Error::internal(error.to_string()))?;
        Ok(Some(ranked))
    }

    /// Stage one: ANN retrieval with a database fallback.
    async fn retrieve_candidates(&self, viewer_id: UserId) -> CoreResult<Vec<Candidate>> {
        let ann = self.ann_candidates(viewer_id).await;
        match ann {
            Ok(candidates) if !candidates.is_empty() => Ok(candidates),
            Ok(_) => {
                debug!(%viewer_id, "vector store returned no candidates; falling back to scan");
                self.fallback_candidates(viewer_id).await
            }
            Err(error) => {
                warn!(%viewer_id, %error, "vector retrieval failed; falling back to scan");
                self.fallback_candidates(viewer_id).await
            }
        }
    }

    async fn ann_candidates(&self, viewer_id: UserId) -> CoreResult<Vec<Candidate>> {
        let vector = self
            .vectors
            .fetch(viewer_id)
            .await
            .map_err(|error| Error::upstream(error.to_string()))?
            .ok_or_else(|| Error::upstream(format!("no stored vector for viewer {viewer_id}")))?;

        let matches = self
            .vectors
            .query_nearest(
                &vector,
                self.config.candidate_pool,
                &VectorFilter::excluding_user(viewer_id),
            )
            .await
            .map_err(|error| Error::upstream(error.to_string()))?;

        Ok(matches
            .into_iter()
            .map(|hit| Candidate {
                user_id: hit.user_id,
                vector_score: hit.score,
            })
            .collect())
    }

    /// Database fallback: recently active users with a neutral vector score.
    async fn fallback_candidates(&self, viewer_id: UserId) -> CoreResult<Vec<Candidate>> {
        let cutoff = self.clock.utc() - chrono::TimeDelta::days(7);
        let users = self
            .users
            .find_active_since(cutoff, self.config.candidate_pool)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;

        Ok(users
            .into_iter()
            .filter(|user| user.id != viewer_id)
            .map(|user: User| Candidate {
                user_id: user.id,
                vector_score: 0.5,
            })
            .collect())
    }

    /// Stage two: union of the four cached safety sets plus stored blocks.
    async fn exclusions(&self, viewer_id: UserId) -> CoreResult<ExclusionSet> {
        let cache = &self.cache_raw;
        let blocked_key = CacheKeys::blocked_set(viewer_id);
        let passed_key = CacheKeys::passed_set(viewer_id);
        let resonated_key = CacheKeys::resonated_set(viewer_id);
        let blocked_by_key = CacheKeys::blocked_by_set(viewer_id);
        let (blocked, passed, resonated, blocked_by) = tokio::join!(
            cache.smembers(&blocked_key),
            cache.smembers(&passed_key),
            cache.smembers(&resonated_key),
            cache.smembers(&blocked_by_key),
        );

        let mut exclusions = ExclusionSet::default();
        for members in [blocked, passed, resonated, blocked_by] {
            exclusions.absorb_members(members.map_err(|error| Error::internal(error.to_string()))?);
        }

        let records = self
            .safety
            .records_involving(viewer_id)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;
        for record in records {
            let other = if record.reporter_id == viewer_id {
                record.reported_id
            } else {
                record.reporter_id
            };
            exclusions.users.insert(other);
        }

        Ok(exclusions)
    }

    /// Stage three: batch context loads plus bounded resonance fan-out.
    async fn score_candidates(
        &self,
        viewer_id: UserId,
        candidates: Vec<Candidate>,
    ) -> CoreResult<Vec<FeedEntry>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let candidate_ids: Vec<UserId> = candidates.iter().map(|c| c.user_id).collect();

        let (profiles, users, recent_matches) = tokio::join!(
            self.profiles.find_many(&candidate_ids),
            self.users.find_many(&candidate_ids),
            self.matches
                .recent_for_users(&candidate_ids, GHOST_MATCH_WINDOW),
        );
        let profiles = profiles.map_err(|error| Error::internal(error.to_string()))?;
        let users = users.map_err(|error| Error::internal(error.to_string()))?;
        let recent_matches = recent_matches.map_err(|error| Error::internal(error.to_string()))?;

        let profile_by_id: HashMap<UserId, _> = profiles
            .into_iter()
            .map(|profile| (profile.user_id, profile))
            .collect();
        let user_by_id: HashMap<UserId, _> =
            users.into_iter().map(|user| (user.id, user)).collect();

        let now = self.clock.utc();
        let semaphore = Arc::new(Semaphore::new(self.config.scoring_concurrency.max(1)));

        let scored = join_all(candidates.into_iter().filter_map(|candidate| {
            let profile = profile_by_id.get(&candidate.user_id)?.clone();
            let user = user_by_id.get(&candidate.user_id)?.clone();
            if user.deleted_at.is_some() {
                return None;
            }
            let matches = recent_matches
                .get(&candidate.user_id)
                .cloned()
                .unwrap_or_default();
            let semaphore = semaphore.clone();
            let resonance = self.resonance.clone();

            Some(async move {
                let _permit = semaphore.acquire().await.ok()?;
                let score = match resonance
                    .score_pair(viewer_id, candidate.user_id, Some(candidate.vector_score))
                    .await
                {
                    Ok(score) => score,
                    Err(error) => {
                        debug!(candidate = %candidate.user_id, %error, "skipping unscorable candidate");
                        return None;
                    }
                };

                let freshness_score = freshness(user.hours_since_active(now));
                let penalty = ghost_penalty(&matches);
                let final_score = blend(
                    score.total,
                    freshness_score,
                    penalty,
                    user.subscription_tier.feed_boost(),
                );

                Some(FeedEntry {
                    user_id: candidate.user_id,
                    vector_score: candidate.vector_score,
                    final_score,
                    archetype: profile.archetype,
                    resonance_score: Some(score.total),
                    waveform: Some(score.waveform),
                    diversity_bonus: 0.0,
                })
            })
        }))
        .await;

        let mut entries: Vec<FeedEntry> = scored.into_iter().flatten().collect();
        entries.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(entries)
    }

    /// Stages four and five: diversity injection on the page slice, then
    /// cursor bookkeeping.
    fn paginate(&self, ranked: &RankedFeed, page_index: usize, limit: usize) -> FeedPage {
        let start = page_index.saturating_mul(limit);
        if start >= ranked.entries.len() {
            return FeedPage {
                profiles: Vec::new(),
                cursor: None,
                total: ranked.entries.len(),
                debug: ranked.debug.clone(),
            };
        }

        let slice_end = (start + limit + 10).min(ranked.entries.len());
        let slice = ranked.entries[start..slice_end].to_vec();
        let profiles = inject_diversity(slice, limit, self.config.diversity_min_share);

        let has_more = start + limit < ranked.entries.len();
        FeedPage {
            profiles,
            cursor: has_more.then(|| (page_index + 1).to_string()),
            total: ranked.entries.len(),
            debug: ranked.debug.clone(),
        }
    }
}

/// A retrieved candidate carrying its ANN score.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    user_id: UserId,
    vector_score: f64,
}
