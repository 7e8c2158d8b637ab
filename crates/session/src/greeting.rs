//! Join-greeting selection.
//!
//! A lightweight read against the memory service picks among three canned
//! templates: first time in this room, returning to this room, or a known
//! user entering a new room. Presence of any matching record is enough to
//! switch template — no relevance filtering. Memory failures silently fall
//! back to the first-time greeting.

use roomrelay_core::memory::{MemoryStore, user_room_key};
use std::sync::Arc;
use tracing::debug;

/// Only presence matters, one record is enough.
const PRESENCE_LIMIT: usize = 1;

pub struct GreetingSelector {
    store: Arc<dyn MemoryStore>,
}

impl GreetingSelector {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Pick the greeting for a user joining a room.
    ///
    /// Room-scoped lookup first; only if it comes back empty is the
    /// user-scoped lookup issued.
    pub async fn greet(&self, username: &str, room: &str) -> String {
        let room_key = user_room_key(username, room);

        match self.store.search(username, &room_key, PRESENCE_LIMIT).await {
            Ok(hits) if !hits.is_empty() => {
                debug!(username, room, "Returning participant");
                return returning_to_room(username, room);
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Greeting lookup failed, using first-time template");
                return first_time(username, room);
            }
        }

        match self.store.search(username, username, PRESENCE_LIMIT).await {
            Ok(hits) if !hits.is_empty() => {
                debug!(username, room, "Known user, new room");
                returning_user_new_room(username, room)
            }
            Ok(_) => first_time(username, room),
            Err(e) => {
                debug!(error = %e, "Greeting lookup failed, using first-time template");
                first_time(username, room)
            }
        }
    }
}

fn first_time(username: &str, room: &str) -> String {
    format!("Welcome to {room}, {username}! I'm the room assistant — ask me anything.")
}

fn returning_to_room(username: &str, room: &str) -> String {
    format!("Welcome back to {room}, {username}! Picking up where we left off.")
}

fn returning_user_new_room(username: &str, room: &str) -> String {
    format!("Good to see you again, {username}! First time in {room} — make yourself at home.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stores::{FailingStore, ScriptedStore};
    use roomrelay_core::MemoryHit;

    fn hit(text: &str) -> MemoryHit {
        MemoryHit {
            text: text.into(),
            score: Some(0.1),
        }
    }

    #[tokio::test]
    async fn brand_new_pair_gets_first_time_template() {
        let selector = GreetingSelector::new(Arc::new(ScriptedStore::default()));
        let greeting = selector.greet("alice", "r1").await;
        assert_eq!(greeting, first_time("alice", "r1"));
    }

    #[tokio::test]
    async fn room_record_switches_to_returning_template() {
        let store = ScriptedStore::default();
        store.script("alice::r1", vec![hit("alice said hi")]);
        let selector = GreetingSelector::new(Arc::new(store));

        let greeting = selector.greet("alice", "r1").await;
        assert_eq!(greeting, returning_to_room("alice", "r1"));
    }

    #[tokio::test]
    async fn user_record_alone_means_new_room() {
        let store = ScriptedStore::default();
        store.script("alice", vec![hit("alice was in another room")]);
        let selector = GreetingSelector::new(Arc::new(store));

        let greeting = selector.greet("alice", "r2").await;
        assert_eq!(greeting, returning_user_new_room("alice", "r2"));
    }

    #[tokio::test]
    async fn low_scored_record_still_counts_as_presence() {
        // No relevance filtering here, unlike context assembly.
        let store = ScriptedStore::default();
        store.script(
            "alice::r1",
            vec![MemoryHit {
                text: "faint memory".into(),
                score: Some(0.01),
            }],
        );
        let selector = GreetingSelector::new(Arc::new(store));

        let greeting = selector.greet("alice", "r1").await;
        assert_eq!(greeting, returning_to_room("alice", "r1"));
    }

    #[tokio::test]
    async fn memory_failure_falls_back_to_first_time() {
        let selector = GreetingSelector::new(Arc::new(FailingStore));
        let greeting = selector.greet("alice", "r1").await;
        assert_eq!(greeting, first_time("alice", "r1"));
    }

    #[tokio::test]
    async fn greeting_flips_after_a_room_scoped_write() {
        use roomrelay_core::memory::WriteMetadata;
        use roomrelay_core::message::ConversationTurn;
        use roomrelay_memory::InMemoryStore;

        let store = Arc::new(InMemoryStore::new());
        let selector = GreetingSelector::new(store.clone());

        assert_eq!(selector.greet("alice", "r1").await, first_time("alice", "r1"));

        store
            .add(
                &[
                    ConversationTurn::user("hello"),
                    ConversationTurn::assistant("hi alice"),
                ],
                &user_room_key("alice", "r1"),
                &WriteMetadata {
                    room: "r1".into(),
                    username: "alice".into(),
                    category: "chat".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            selector.greet("alice", "r1").await,
            returning_to_room("alice", "r1")
        );
    }

    #[tokio::test]
    async fn user_lookup_is_skipped_when_room_lookup_matches() {
        let store = ScriptedStore::default();
        store.script("alice::r1", vec![hit("seen before")]);
        let store = Arc::new(store);
        let selector = GreetingSelector::new(store.clone());

        selector.greet("alice", "r1").await;
        assert_eq!(store.calls().len(), 1);
    }
}
