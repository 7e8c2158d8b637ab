//! Shared memory-store doubles for this crate's tests.

use async_trait::async_trait;
use roomrelay_core::error::MemoryError;
use roomrelay_core::memory::{MemoryHit, MemoryStore, WriteMetadata};
use roomrelay_core::message::ConversationTurn;
use std::collections::HashMap;
use std::sync::Mutex;

/// Returns scripted hits per partition and records every call.
#[derive(Default)]
pub struct ScriptedStore {
    hits: Mutex<HashMap<String, Vec<MemoryHit>>>,
    search_calls: Mutex<Vec<(String, usize)>>,
    add_calls: Mutex<Vec<(String, Vec<ConversationTurn>, WriteMetadata)>>,
}

impl ScriptedStore {
    pub fn script(&self, partition: &str, hits: Vec<MemoryHit>) {
        self.hits.lock().unwrap().insert(partition.into(), hits);
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn adds(&self) -> Vec<(String, Vec<ConversationTurn>, WriteMetadata)> {
        self.add_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryStore for ScriptedStore {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(
        &self,
        _query: &str,
        partition: &str,
        limit: usize,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        self.search_calls
            .lock()
            .unwrap()
            .push((partition.to_string(), limit));
        let mut hits = self
            .hits
            .lock()
            .unwrap()
            .get(partition)
            .cloned()
            .unwrap_or_default();
        hits.truncate(limit);
        Ok(hits)
    }

    async fn add(
        &self,
        turns: &[ConversationTurn],
        partition: &str,
        metadata: &WriteMetadata,
    ) -> Result<(), MemoryError> {
        self.add_calls.lock().unwrap().push((
            partition.to_string(),
            turns.to_vec(),
            metadata.clone(),
        ));
        Ok(())
    }
}

/// Every operation fails, simulating an unreachable memory service.
pub struct FailingStore;

#[async_trait]
impl MemoryStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _query: &str,
        _partition: &str,
        _limit: usize,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        Err(MemoryError::Unavailable("connection refused".into()))
    }

    async fn add(
        &self,
        _turns: &[ConversationTurn],
        _partition: &str,
        _metadata: &WriteMetadata,
    ) -> Result<(), MemoryError> {
        Err(MemoryError::WriteFailed("connection refused".into()))
    }
}
