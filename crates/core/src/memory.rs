//! MemoryStore trait — the abstraction over the external long-term memory
//! service.
//!
//! The service owns persistence, relevance scoring, and its own retrieval
//! semantics; this system only partitions records by key. Two partition
//! families exist: a room-scoped key (`username::room`) and a user-scoped
//! key (`username` alone).
//!
//! Implementations: HTTP client, in-memory (for testing), no-op (disabled).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::message::ConversationTurn;

/// Which partition family a retrieved record came from. Attached when the
/// two lookup result sets are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionScope {
    /// Scoped to a (username, room) pair
    Room,
    /// Scoped to a username across all rooms
    User,
}

/// A single record returned by a memory search.
///
/// Read-only to this system. The relevance score is owned by the service;
/// it may be absent, in which case callers treat it as 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryHit {
    /// The remembered text.
    pub text: String,

    /// Semantic match strength against the query, in [0, 1], if reported.
    pub score: Option<f32>,
}

/// Metadata attached to every memory write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    pub room: String,
    pub username: String,
    pub category: String,
}

/// The fixed separator used to build a room-scoped partition key.
pub const PARTITION_SEPARATOR: &str = "::";

/// Derive the room-scoped partition key for a (username, room) pair.
///
/// Deterministic for a given pair; reversibility is not required.
pub fn user_room_key(username: &str, room: &str) -> String {
    format!("{username}{PARTITION_SEPARATOR}{room}")
}

/// The core MemoryStore trait.
///
/// Both operations are best-effort from the caller's perspective: search
/// failures degrade to empty context, write failures are logged and dropped.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The store name (e.g., "http", "in_memory", "noop").
    fn name(&self) -> &str;

    /// Search a partition for records relevant to `query`, capped at `limit`.
    async fn search(
        &self,
        query: &str,
        partition: &str,
        limit: usize,
    ) -> std::result::Result<Vec<MemoryHit>, MemoryError>;

    /// Persist a sequence of turns under a partition key.
    async fn add(
        &self,
        turns: &[ConversationTurn],
        partition: &str,
        metadata: &WriteMetadata,
    ) -> std::result::Result<(), MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_room_key_is_deterministic() {
        assert_eq!(user_room_key("alice", "r1"), "alice::r1");
        assert_eq!(user_room_key("alice", "r1"), user_room_key("alice", "r1"));
    }

    #[test]
    fn user_room_key_distinguishes_pairs() {
        assert_ne!(user_room_key("alice", "r1"), user_room_key("alice", "r2"));
        assert_ne!(user_room_key("alice", "r1"), user_room_key("bob", "r1"));
    }
}
