//! In-memory store — useful for testing and local development.
//!
//! Relevance is a crude keyword-overlap score; good enough to exercise the
//! ranking and threshold behavior of callers without a real service.

use async_trait::async_trait;
use roomrelay_core::error::MemoryError;
use roomrelay_core::memory::{MemoryHit, MemoryStore, WriteMetadata};
use roomrelay_core::message::ConversationTurn;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store keyed by partition.
pub struct InMemoryStore {
    partitions: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            partitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a partition directly (test convenience).
    pub async fn seed(&self, partition: &str, texts: &[&str]) {
        let mut partitions = self.partitions.write().await;
        let entries = partitions.entry(partition.to_string()).or_default();
        entries.extend(texts.iter().map(|t| t.to_string()));
    }

    /// Number of entries in a partition (test convenience).
    pub async fn partition_len(&self, partition: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(partition)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn keyword_score(query: &str, text: &str) -> f32 {
    let text_lower = text.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matched = words
        .iter()
        .filter(|w| text_lower.contains(&w.to_lowercase()))
        .count();
    matched as f32 / words.len() as f32
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(
        &self,
        query: &str,
        partition: &str,
        limit: usize,
    ) -> std::result::Result<Vec<MemoryHit>, MemoryError> {
        let partitions = self.partitions.read().await;
        let Some(entries) = partitions.get(partition) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<MemoryHit> = entries
            .iter()
            .map(|text| MemoryHit {
                text: text.clone(),
                score: Some(keyword_score(query, text)),
            })
            .filter(|h| h.score.unwrap_or(0.0) > 0.0)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn add(
        &self,
        turns: &[ConversationTurn],
        partition: &str,
        _metadata: &WriteMetadata,
    ) -> std::result::Result<(), MemoryError> {
        let mut partitions = self.partitions.write().await;
        let entries = partitions.entry(partition.to_string()).or_default();
        entries.extend(turns.iter().map(|t| t.content.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomrelay_core::memory::user_room_key;

    fn metadata() -> WriteMetadata {
        WriteMetadata {
            room: "r1".into(),
            username: "alice".into(),
            category: "chat".into(),
        }
    }

    #[tokio::test]
    async fn add_and_search_within_partition() {
        let store = InMemoryStore::new();
        store
            .add(
                &[ConversationTurn::user("the weather in oslo is cold")],
                &user_room_key("alice", "r1"),
                &metadata(),
            )
            .await
            .unwrap();

        let hits = store
            .search("weather oslo", &user_room_key("alice", "r1"), 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score.unwrap() > 0.5);
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let store = InMemoryStore::new();
        store.seed("alice::r1", &["room fact"]).await;

        let hits = store.search("room fact", "alice", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let store = InMemoryStore::new();
        store
            .seed("alice", &["rust one", "rust two", "rust three"])
            .await;

        let hits = store.search("rust", "alice", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
