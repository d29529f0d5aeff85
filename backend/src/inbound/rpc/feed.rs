//! Discovery feed RPC: `feed.discover`.

use std::sync::Arc;

use crate::domain::feed::{FeedPage, FeedRanker};
use crate::domain::{CoreResult, Error};

use super::AuthContext;

/// Limit bounds accepted at the boundary.
const LIMIT_MIN: usize = 1;
const LIMIT_MAX: usize = 50;

/// Feed RPC handler.
pub struct FeedRpc {
    ranker: Arc<FeedRanker>,
}

impl FeedRpc {
    pub fn new(ranker: Arc<FeedRanker>) -> Self {
        Self { ranker }
    }

    /// One page of the caller's ranked discovery feed.
    pub async fn discover(
        &self,
        ctx: &AuthContext,
        cursor: Option<String>,
        limit: Option<usize>,
    ) -> CoreResult<FeedPage> {
        let viewer = ctx.require_user()?;

        if let Some(limit) = limit {
            if !(LIMIT_MIN..=LIMIT_MAX).contains(&limit) {
                return Err(Error::invalid_request(format!(
                    "limit must be between {LIMIT_MIN} and {LIMIT_MAX}, got {limit}"
                )));
            }
        }

        self.ranker.discover(viewer, cursor.as_deref(), limit).await
    }
}
