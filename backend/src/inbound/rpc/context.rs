//! Caller context for the RPC surface.
//!
//! Session establishment is owned by the external auth layer; handlers only
//! see the resolved user id, if any. Protected procedures fail before any
//! core code runs when the context is anonymous.

use crate::domain::{CoreResult, Error, UserId};

/// Resolved caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    user_id: Option<UserId>,
}

impl AuthContext {
    /// Context for an authenticated session.
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Context for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// The caller's user id, or `Unauthorized` for anonymous sessions.
    pub fn require_user(&self) -> CoreResult<UserId> {
        self.user_id
            .ok_or_else(|| Error::unauthorized("a signed-in session is required"))
    }
}
