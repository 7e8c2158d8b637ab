//! No-op store — stands in when no memory service is configured.
//!
//! Searches return nothing and writes vanish, which is exactly the
//! degraded behavior the orchestration layer already tolerates.

use async_trait::async_trait;
use roomrelay_core::error::MemoryError;
use roomrelay_core::memory::{MemoryHit, MemoryStore, WriteMetadata};
use roomrelay_core::message::ConversationTurn;

pub struct NoopMemoryStore;

#[async_trait]
impl MemoryStore for NoopMemoryStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn search(
        &self,
        _query: &str,
        _partition: &str,
        _limit: usize,
    ) -> std::result::Result<Vec<MemoryHit>, MemoryError> {
        Ok(Vec::new())
    }

    async fn add(
        &self,
        _turns: &[ConversationTurn],
        _partition: &str,
        _metadata: &WriteMetadata,
    ) -> std::result::Result<(), MemoryError> {
        Ok(())
    }
}
