//! Context assembly — builds the bounded prompt window for one chat turn.
//!
//! The window has a fixed shape: one synthesized system turn (base
//! instruction, plus a block of ranked memory snippets when any survive
//! filtering), the most recent conversation turns in original order, and
//! the new user message last.
//!
//! Both memory lookups are best-effort: a failed or timed-out lookup
//! degrades to an empty result set and the window is still valid.

use roomrelay_config::{ChatConfig, MemoryConfig};
use roomrelay_core::memory::{MemoryStore, PartitionScope, user_room_key};
use roomrelay_core::message::ConversationTurn;
use std::sync::Arc;
use tracing::warn;

/// Tuning knobs for assembly, fixed at startup.
#[derive(Debug, Clone)]
pub struct ContextPolicy {
    /// Result cap for the room-scoped lookup.
    pub room_limit: usize,
    /// Result cap for the user-scoped lookup.
    pub user_limit: usize,
    /// Snippets retained after merge/rank.
    pub max_snippets: usize,
    /// Records scoring at or below this are dropped, not truncated-and-kept.
    pub min_score: f32,
    /// Recent turns carried into the window.
    pub history_window: usize,
    /// Base system instruction.
    pub system_prompt: String,
}

impl ContextPolicy {
    pub fn from_config(memory: &MemoryConfig, chat: &ChatConfig) -> Self {
        Self {
            room_limit: memory.room_limit,
            user_limit: memory.user_limit,
            max_snippets: memory.max_snippets,
            min_score: memory.min_score,
            history_window: chat.history_window,
            system_prompt: chat.system_prompt.clone(),
        }
    }
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default(), &ChatConfig::default())
    }
}

/// The assembled prompt window. Request-scoped, never persisted.
#[derive(Debug, Clone)]
pub struct PromptWindow {
    /// Ordered turns: system, recent history, new user message.
    pub turns: Vec<ConversationTurn>,
}

/// A merged, ranked memory snippet.
#[derive(Debug, Clone)]
struct RankedSnippet {
    text: String,
    score: f32,
    scope: PartitionScope,
}

/// The context assembler. Stateless apart from its store handle — create
/// one at startup and share it.
pub struct ContextAssembler {
    store: Arc<dyn MemoryStore>,
    policy: ContextPolicy,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn MemoryStore>, policy: ContextPolicy) -> Self {
        Self { store, policy }
    }

    /// Build the prompt window for one incoming message.
    ///
    /// 1. Room-scoped and user-scoped lookups run concurrently, both
    ///    querying with the inbound message.
    /// 2. Results are merged, tagged with their origin partition, sorted
    ///    descending by score (absent score ranks as 0.0), filtered by the
    ///    minimum relevance threshold, and capped.
    /// 3. The system turn, the last `history_window` recent turns (original
    ///    order), and the new message form the window.
    pub async fn assemble(
        &self,
        message: &str,
        username: &str,
        room: &str,
        recent_turns: &[ConversationTurn],
    ) -> PromptWindow {
        let room_key = user_room_key(username, room);

        let (room_hits, user_hits) = tokio::join!(
            self.store.search(message, &room_key, self.policy.room_limit),
            self.store.search(message, username, self.policy.user_limit),
        );

        let room_hits = room_hits.unwrap_or_else(|e| {
            warn!(partition = %room_key, error = %e, "Room-scoped memory lookup failed, continuing without");
            Vec::new()
        });
        let user_hits = user_hits.unwrap_or_else(|e| {
            warn!(partition = %username, error = %e, "User-scoped memory lookup failed, continuing without");
            Vec::new()
        });

        let snippets = self.rank(room_hits, user_hits);

        let mut turns = Vec::with_capacity(2 + recent_turns.len().min(self.policy.history_window));
        turns.push(ConversationTurn::system(self.render_system(&snippets)));

        let start = recent_turns
            .len()
            .saturating_sub(self.policy.history_window);
        turns.extend_from_slice(&recent_turns[start..]);

        turns.push(ConversationTurn::user(message));

        PromptWindow { turns }
    }

    /// Merge the two result sets, rank, threshold, cap.
    fn rank(
        &self,
        room_hits: Vec<roomrelay_core::MemoryHit>,
        user_hits: Vec<roomrelay_core::MemoryHit>,
    ) -> Vec<RankedSnippet> {
        let mut merged: Vec<RankedSnippet> = room_hits
            .into_iter()
            .map(|h| (h, PartitionScope::Room))
            .chain(user_hits.into_iter().map(|h| (h, PartitionScope::User)))
            .map(|(h, scope)| RankedSnippet {
                text: h.text,
                score: h.score.unwrap_or(0.0),
                scope,
            })
            .collect();

        // Stable sort keeps room-before-user order among equal scores.
        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        merged.retain(|s| s.score > self.policy.min_score);
        merged.truncate(self.policy.max_snippets);
        merged
    }

    /// Render the system turn; the memory block is omitted entirely when
    /// nothing survived filtering.
    fn render_system(&self, snippets: &[RankedSnippet]) -> String {
        if snippets.is_empty() {
            return self.policy.system_prompt.clone();
        }

        let mut out = String::with_capacity(self.policy.system_prompt.len() + 128);
        out.push_str(&self.policy.system_prompt);
        out.push_str("\n\nRelevant context from earlier conversations:\n");
        for snippet in snippets {
            let origin = match snippet.scope {
                PartitionScope::Room => "this room",
                PartitionScope::User => "another conversation",
            };
            out.push_str(&format!("- [earlier, {origin}] {}\n", snippet.text));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stores::{FailingStore, ScriptedStore};
    use roomrelay_core::MemoryHit;

    fn recent(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationTurn::user(format!("turn {i}"))
                } else {
                    ConversationTurn::assistant(format!("turn {i}"))
                }
            })
            .collect()
    }

    fn hit(text: &str, score: Option<f32>) -> MemoryHit {
        MemoryHit {
            text: text.into(),
            score,
        }
    }

    #[tokio::test]
    async fn window_bounds_recent_turns_to_ten() {
        let store = Arc::new(ScriptedStore::default());
        let assembler = ContextAssembler::new(store, ContextPolicy::default());

        let history = recent(25);
        let window = assembler
            .assemble("hello", "alice", "r1", &history)
            .await;

        // system + 10 recent + new message
        assert_eq!(window.turns.len(), 12);
        // Original relative order preserved, earliest simply dropped.
        assert_eq!(window.turns[1].content, "turn 15");
        assert_eq!(window.turns[10].content, "turn 24");
        assert_eq!(window.turns[11].content, "hello");
    }

    #[tokio::test]
    async fn short_history_is_carried_whole() {
        let store = Arc::new(ScriptedStore::default());
        let assembler = ContextAssembler::new(store, ContextPolicy::default());

        let history = recent(3);
        let window = assembler.assemble("hi", "alice", "r1", &history).await;
        assert_eq!(window.turns.len(), 5);
        assert_eq!(window.turns[1].content, "turn 0");
    }

    #[tokio::test]
    async fn both_lookups_failing_still_yields_valid_window() {
        let store = Arc::new(FailingStore);
        let assembler = ContextAssembler::new(store, ContextPolicy::default());

        let history = recent(2);
        let window = assembler.assemble("hello", "alice", "r1", &history).await;

        assert_eq!(window.turns.len(), 4);
        assert!(!window.turns[0].content.contains("earlier"));
        assert_eq!(window.turns[3].content, "hello");
    }

    #[tokio::test]
    async fn records_at_or_below_threshold_are_dropped() {
        let store = ScriptedStore::default();
        store.script(
            "alice::r1",
            vec![hit("exactly at threshold", Some(0.5)), hit("below", Some(0.3))],
        );
        store.script("alice", vec![hit("unscored", None)]);
        let assembler = ContextAssembler::new(Arc::new(store), ContextPolicy::default());

        let window = assembler.assemble("hello", "alice", "r1", &[]).await;
        assert!(!window.turns[0].content.contains("earlier"));
    }

    #[tokio::test]
    async fn inclusion_is_monotonic_in_relevance() {
        let store = ScriptedStore::default();
        store.script(
            "alice::r1",
            vec![
                hit("a", Some(0.9)),
                hit("b", Some(0.85)),
                hit("c", Some(0.8)),
                hit("d", Some(0.75)),
            ],
        );
        store.script("alice", vec![hit("e", Some(0.7)), hit("f", Some(0.6))]);
        let assembler = ContextAssembler::new(Arc::new(store), ContextPolicy::default());

        let window = assembler.assemble("hello", "alice", "r1", &[]).await;
        let system = &window.turns[0].content;
        // Top five survive the cap; the 0.6 record is the one cut.
        for kept in ["a", "b", "c", "d", "e"] {
            assert!(system.contains(&format!("] {kept}\n")), "missing {kept}");
        }
        assert!(!system.contains("] f\n"));
    }

    #[tokio::test]
    async fn scenario_merges_and_orders_across_partitions() {
        // message="hello", two room records (0.9, 0.3), one user record (0.6)
        // → block contains 0.9 then 0.6, discarding 0.3.
        let store = ScriptedStore::default();
        store.script(
            "alice::r1",
            vec![
                hit("alice prefers terse answers", Some(0.9)),
                hit("stale note", Some(0.3)),
            ],
        );
        store.script("alice", vec![hit("alice works on rust", Some(0.6))]);
        let assembler = ContextAssembler::new(Arc::new(store), ContextPolicy::default());

        let window = assembler.assemble("hello", "alice", "r1", &[]).await;
        let system = &window.turns[0].content;

        let terse = system.find("alice prefers terse answers").unwrap();
        let rust = system.find("alice works on rust").unwrap();
        assert!(terse < rust);
        assert!(!system.contains("stale note"));
    }

    #[tokio::test]
    async fn snippets_are_marked_with_their_origin() {
        let store = ScriptedStore::default();
        store.script("alice::r1", vec![hit("room memory", Some(0.9))]);
        store.script("alice", vec![hit("user memory", Some(0.8))]);
        let assembler = ContextAssembler::new(Arc::new(store), ContextPolicy::default());

        let window = assembler.assemble("hello", "alice", "r1", &[]).await;
        let system = &window.turns[0].content;
        assert!(system.contains("[earlier, this room] room memory"));
        assert!(system.contains("[earlier, another conversation] user memory"));
    }

    #[tokio::test]
    async fn lookups_use_the_expected_partitions_and_limits() {
        let store = ScriptedStore::default();
        let store = Arc::new(store);
        let assembler = ContextAssembler::new(store.clone(), ContextPolicy::default());

        assembler.assemble("hello", "alice", "r1", &[]).await;

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&("alice::r1".to_string(), 5)));
        assert!(calls.contains(&("alice".to_string(), 3)));
    }
}
