//! Core configuration objects.
//!
//! Plain builder-style structs with conservative defaults; the embedding
//! process decides where values come from.

use std::time::Duration;

/// Cache TTLs for the core's derived artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtlConfig {
    /// Resonance profile projection.
    pub profile: Duration,
    /// Ranked feed and emitted pages.
    pub feed: Duration,
    /// Pairwise resonance score.
    pub resonance_score: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            profile: Duration::from_secs(24 * 60 * 60),
            feed: Duration::from_secs(3 * 60),
            resonance_score: Duration::from_secs(60 * 60),
        }
    }
}

/// Profile-rebuild scheduling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildConfig {
    /// A user counts as active when last seen within this many days.
    pub active_window_days: i64,
    /// Daily pass skips profiles younger than this.
    pub freshness_threshold: Duration,
    /// Retries for the voice-note cold-start trigger.
    pub voice_note_retries: u32,
    /// Retries for the daily batch.
    pub daily_retries: u32,
    /// Upper bound on users considered per daily pass.
    pub daily_user_limit: usize,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            active_window_days: 7,
            freshness_threshold: Duration::from_secs(48 * 60 * 60),
            voice_note_retries: 3,
            daily_retries: 2,
            daily_user_limit: 10_000,
        }
    }
}

/// Feed pipeline knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedConfig {
    /// Default page size when the caller does not specify a limit.
    pub page_size: usize,
    /// Maximum page size accepted at the RPC boundary.
    pub max_page_size: usize,
    /// Candidate pool fetched from the vector store.
    pub candidate_pool: usize,
    /// Minimum share of a page reserved for non-dominant archetypes.
    pub diversity_min_share: f64,
    /// Concurrent resonance scorings during soft scoring.
    pub scoring_concurrency: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            max_page_size: 50,
            candidate_pool: 500,
            diversity_min_share: 0.2,
            scoring_concurrency: 8,
        }
    }
}

/// Conversation-health sweep knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSweepConfig {
    /// Conversations with a message within this many days are swept.
    pub sweep_window_days: i64,
    /// Retries for the scheduled sweep.
    pub sweep_retries: u32,
}

impl Default for HealthSweepConfig {
    fn default() -> Self {
        Self {
            sweep_window_days: 7,
            sweep_retries: 2,
        }
    }
}

/// Sliding-window limit shared by the embedding and completion clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_calls: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 3_000,
            window: Duration::from_secs(60),
        }
    }
}

/// Aggregate configuration for the matching core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoreConfig {
    pub ttl: CacheTtlConfig,
    pub rebuild: RebuildConfig,
    pub feed: FeedConfig,
    pub health: HealthSweepConfig,
    pub rate_limit: RateLimitConfig,
    pub io_deadline: IoDeadline,
}

/// Deadline applied to every generative upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoDeadline(pub Duration);

impl Default for IoDeadline {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}
