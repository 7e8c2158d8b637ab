//! RoomControl trait — the abstraction over the real-time media platform's
//! room-management API.
//!
//! Every operation is a single request/response call against the platform's
//! control plane. This system treats them as opaque CRUD: no retry or
//! composition logic of its own. The platform owns room state, participant
//! state, and the signaling protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RoomError;

/// A room as reported by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomInfo {
    /// Platform-assigned room identifier
    pub sid: String,

    /// The room name (unique, chosen by us)
    pub name: String,

    /// Seconds the room lingers with no participants before closing
    pub empty_timeout: u32,

    /// Participant cap
    pub max_participants: u32,

    /// Unix timestamp of room creation
    pub creation_time: i64,

    /// Current participant count
    pub num_participants: u32,
}

/// A published track as reported by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackInfo {
    pub sid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub muted: bool,
}

/// A participant as reported by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantInfo {
    pub sid: String,

    /// The participant identity (our username)
    pub identity: String,

    /// Connection state as reported by the platform
    pub state: String,

    /// Application metadata attached to the participant
    pub metadata: String,

    /// Unix timestamp the participant joined
    pub joined_at: i64,

    /// Published tracks
    pub tracks: Vec<TrackInfo>,
}

/// Permission updates for a participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantPermissions {
    pub can_subscribe: bool,
    pub can_publish: bool,
    pub can_publish_data: bool,
}

/// The core RoomControl trait.
///
/// Implemented by the platform HTTP client; mocked in gateway tests.
#[async_trait]
pub trait RoomControl: Send + Sync {
    /// Create a room, or return the existing one (creation is idempotent
    /// on the platform side).
    async fn create_room(&self, name: &str) -> std::result::Result<RoomInfo, RoomError>;

    /// Delete a room, disconnecting all participants.
    async fn delete_room(&self, name: &str) -> std::result::Result<(), RoomError>;

    /// List all active rooms.
    async fn list_rooms(&self) -> std::result::Result<Vec<RoomInfo>, RoomError>;

    /// List participants currently in a room.
    async fn list_participants(
        &self,
        room: &str,
    ) -> std::result::Result<Vec<ParticipantInfo>, RoomError>;

    /// Get a single participant by identity.
    async fn get_participant(
        &self,
        room: &str,
        identity: &str,
    ) -> std::result::Result<ParticipantInfo, RoomError>;

    /// Remove a participant from a room.
    async fn remove_participant(
        &self,
        room: &str,
        identity: &str,
    ) -> std::result::Result<(), RoomError>;

    /// Move a participant to another room. The platform handles the rejoin;
    /// control-plane side this is a forced transfer.
    async fn move_participant(
        &self,
        room: &str,
        identity: &str,
        destination: &str,
    ) -> std::result::Result<(), RoomError>;

    /// Update a participant's metadata and/or permissions.
    async fn update_participant(
        &self,
        room: &str,
        identity: &str,
        metadata: Option<String>,
        permissions: Option<ParticipantPermissions>,
    ) -> std::result::Result<ParticipantInfo, RoomError>;

    /// Mute or unmute a participant's published track.
    async fn mute_track(
        &self,
        room: &str,
        identity: &str,
        track_sid: &str,
        muted: bool,
    ) -> std::result::Result<(), RoomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_info_deserializes_camel_case() {
        let json = r#"{"sid":"RM_x","name":"lobby","emptyTimeout":600,"maxParticipants":20,"creationTime":1700000000,"numParticipants":2}"#;
        let room: RoomInfo = serde_json::from_str(json).unwrap();
        assert_eq!(room.name, "lobby");
        assert_eq!(room.empty_timeout, 600);
        assert_eq!(room.num_participants, 2);
    }

    #[test]
    fn participant_info_tolerates_missing_fields() {
        let json = r#"{"identity":"alice"}"#;
        let p: ParticipantInfo = serde_json::from_str(json).unwrap();
        assert_eq!(p.identity, "alice");
        assert!(p.tracks.is_empty());
    }
}
