//! Fire-and-forget memory persistence.
//!
//! After a successful completion, the new turn pair is written to both the
//! room-scoped and the user-scoped partition. The request path only
//! enqueues: a detached worker drains a bounded queue, so the HTTP response
//! never waits on the memory service. On queue overflow the job is dropped
//! and logged — the source imposes no durability guarantee on these writes.

use roomrelay_core::memory::{MemoryStore, WriteMetadata, user_room_key};
use roomrelay_core::message::ConversationTurn;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The metadata category attached to chat-turn writes.
const CHAT_CATEGORY: &str = "chat";

struct WriteJob {
    user_turn: ConversationTurn,
    assistant_turn: ConversationTurn,
    username: String,
    room: String,
}

/// Handle for enqueueing turn-pair writes. Cloneable; dropping the last
/// clone shuts the worker down after it drains the queue.
#[derive(Clone)]
pub struct MemoryWriter {
    tx: mpsc::Sender<WriteJob>,
}

impl MemoryWriter {
    /// Spawn the worker task and return the enqueue handle.
    pub fn spawn(store: Arc<dyn MemoryStore>, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(run_worker(store, rx));
        Self { tx }
    }

    /// Enqueue a turn pair for persistence. Never blocks and never fails
    /// from the caller's perspective; a full queue drops the job with a
    /// diagnostic.
    pub fn persist(
        &self,
        user_turn: ConversationTurn,
        assistant_turn: ConversationTurn,
        username: &str,
        room: &str,
    ) {
        let job = WriteJob {
            user_turn,
            assistant_turn,
            username: username.to_string(),
            room: room.to_string(),
        };
        if let Err(e) = self.tx.try_send(job) {
            warn!(error = %e, "Memory write queue full, dropping turn pair");
        }
    }
}

async fn run_worker(store: Arc<dyn MemoryStore>, mut rx: mpsc::Receiver<WriteJob>) {
    while let Some(job) = rx.recv().await {
        let turns = [job.user_turn, job.assistant_turn];
        let room_key = user_room_key(&job.username, &job.room);
        let metadata = WriteMetadata {
            room: job.room.clone(),
            username: job.username.clone(),
            category: CHAT_CATEGORY.into(),
        };

        // The two writes are independent; partial success is terminal.
        let (room_result, user_result) = tokio::join!(
            store.add(&turns, &room_key, &metadata),
            store.add(&turns, &job.username, &metadata),
        );

        if let Err(e) = room_result {
            warn!(partition = %room_key, error = %e, "Room-scoped memory write failed");
        }
        if let Err(e) = user_result {
            warn!(partition = %job.username, error = %e, "User-scoped memory write failed");
        }
        debug!(username = %job.username, room = %job.room, "Turn pair persisted");
    }
}
