//! Room-session orchestration for roomrelay.
//!
//! This crate is the one part of the system with more than one moving part:
//!
//! - [`ContextAssembler`] gathers prior-conversation context from the memory
//!   service (room-scoped and user-scoped), ranks it, and builds a bounded
//!   prompt window.
//! - [`ChatService`] runs the full flow: assemble → complete → fire-and-forget
//!   persist.
//! - [`MemoryWriter`] drains a bounded queue of turn pairs into both memory
//!   partitions, off the request path.
//! - [`GreetingSelector`] picks a join greeting from what the memory service
//!   remembers about the (user, room) pair.
//!
//! The failure policy throughout: best-effort context reads fail open to
//! empty context, the completion call is the only failure that propagates,
//! and persistence failures are logged and dropped.

pub mod chat;
pub mod context;
pub mod greeting;
pub mod writer;

pub use chat::{ChatService, GenerationParams};
pub use context::{ContextAssembler, ContextPolicy, PromptWindow};
pub use greeting::GreetingSelector;
pub use writer::MemoryWriter;

#[cfg(test)]
pub(crate) mod test_stores;
