//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cache;
mod conversation_repository;
mod embedding;
mod event_repository;
mod match_repository;
mod message_repository;
mod profile_repository;
mod safety_repository;
mod user_repository;
mod vector_store;

pub use cache::{CacheError, CacheKeys, CacheStore, CacheTtl, TypedCache};
#[cfg(test)]
pub use cache::MockCacheStore;
pub use conversation_repository::{
    ConversationRepository, ConversationRepositoryError, FixtureConversationRepository,
    NudgeUpdate,
};
#[cfg(test)]
pub use conversation_repository::MockConversationRepository;
pub use embedding::{
    CompletionClient, CompletionParams, EmbeddingClient, EmbeddingResponse,
    FixtureCompletionClient, FixtureEmbeddingClient, GenerativeClientError,
};
#[cfg(test)]
pub use embedding::{MockCompletionClient, MockEmbeddingClient};
pub use event_repository::{EventRepository, EventRepositoryError, FixtureEventRepository};
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use match_repository::{FixtureMatchRepository, MatchRepository, MatchRepositoryError};
#[cfg(test)]
pub use match_repository::MockMatchRepository;
pub use message_repository::{
    FixtureMessageRepository, MessageRepository, MessageRepositoryError,
};
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use profile_repository::{
    FixtureProfileRepository, ProfileRepository, ProfileRepositoryError,
};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use safety_repository::{FixtureSafetyRepository, SafetyRepository, SafetyRepositoryError};
#[cfg(test)]
pub use safety_repository::MockSafetyRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use vector_store::{
    EMBEDDING_DIMENSIONS, FixtureVectorStore, VectorFilter, VectorMatch, VectorMetadata,
    VectorStore, VectorStoreError,
};
#[cfg(test)]
pub use vector_store::MockVectorStore;
