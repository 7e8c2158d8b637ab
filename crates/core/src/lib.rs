//! # roomrelay Core
//!
//! Domain types, traits, and error definitions for the roomrelay control-plane
//! server. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion service, memory service, room
//! platform) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod rooms;

// Re-export key types at crate root for ergonomics
pub use error::{CompletionError, Error, MemoryError, Result, RoomError};
pub use memory::{MemoryHit, MemoryStore, PartitionScope, WriteMetadata, user_room_key};
pub use message::{ConversationTurn, Role};
pub use provider::{CompletionProvider, CompletionRequest};
pub use rooms::{ParticipantInfo, ParticipantPermissions, RoomControl, RoomInfo, TrackInfo};
