//! Strongly typed entity identifiers.
//!
//! Every aggregate referenced across port boundaries is keyed by a UUID
//! newtype so call sites cannot transpose, say, a conversation id and a user
//! id without a compile error.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_entity_id {
    (
        $(#[$outer:meta])*
        $name:ident
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_entity_id! {
    /// Identifier of an application user.
    UserId
}

define_entity_id! {
    /// Identifier of a conversation between two matched users.
    ConversationId
}

define_entity_id! {
    /// Identifier of a match pair.
    MatchId
}

define_entity_id! {
    /// Identifier of a client session used to group behavioural events.
    SessionId
}

/// Order two user identifiers canonically (ascending by UUID).
///
/// Matches and pairwise cache keys are always stored under the sorted pair so
/// `(a, b)` and `(b, a)` address the same record.
///
/// # Examples
/// ```
/// use resonate_backend::domain::{UserId, canonical_pair};
///
/// let a = UserId::random();
/// let b = UserId::random();
/// assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
/// ```
pub fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_sorts_both_orders_identically() {
        let a = UserId::random();
        let b = UserId::random();

        let pair = canonical_pair(a, b);
        assert_eq!(pair, canonical_pair(b, a));
        assert!(pair.0 <= pair.1);
    }

    #[test]
    fn display_matches_uuid_formatting() {
        let raw = Uuid::new_v4();
        let id = UserId::from_uuid(raw);
        assert_eq!(id.to_string(), raw.to_string());
    }
}
