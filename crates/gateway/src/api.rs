//! Route handlers for the flat API surface the web client consumes.
//!
//! Endpoints:
//!
//! - `POST /getToken`          — Issue a signed room access token
//! - `POST /createRoom`        — Create (or fetch) a room
//! - `GET  /listRooms`         — List active rooms
//! - `POST /deleteRoom`        — Delete a room
//! - `POST /listParticipants`  — List participants in a room
//! - `POST /removeParticipant` — Kick a participant
//! - `POST /updateParticipant` — Update metadata/permissions
//! - `POST /moveParticipant`   — Move a participant to another room
//! - `POST /muteTrack`         — Mute/unmute a published track
//! - `POST /checkUsername`     — Identity availability within a room
//! - `POST /joinRoom`          — Ensure room exists, return a greeting
//! - `POST /chat`              — One chat turn through the completion relay

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use roomrelay_core::message::ConversationTurn;
use roomrelay_core::rooms::{ParticipantInfo, ParticipantPermissions, RoomInfo};
use roomrelay_rooms::{AccessToken, VideoGrants};

use crate::SharedState;

/// Build the API router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/getToken", post(get_token_handler))
        .route("/createRoom", post(create_room_handler))
        .route("/listRooms", get(list_rooms_handler))
        .route("/deleteRoom", post(delete_room_handler))
        .route("/listParticipants", post(list_participants_handler))
        .route("/removeParticipant", post(remove_participant_handler))
        .route("/updateParticipant", post(update_participant_handler))
        .route("/moveParticipant", post(move_participant_handler))
        .route("/muteTrack", post(mute_track_handler))
        .route("/checkUsername", post(check_username_handler))
        .route("/joinRoom", post(join_room_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
}

// ── Error mapping ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "Upstream call failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Validate a required request field, producing the 400 contract the web
/// client expects: a message naming the missing field.
fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(bad_request(format!("{name} is required."))),
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RoomDto {
    name: String,
    sid: String,
    num_participants: u32,
    creation_time: i64,
    max_participants: u32,
}

impl From<RoomInfo> for RoomDto {
    fn from(room: RoomInfo) -> Self {
        Self {
            name: room.name,
            sid: room.sid,
            num_participants: room.num_participants,
            creation_time: room.creation_time,
            max_participants: room.max_participants,
        }
    }
}

#[derive(Serialize)]
struct ParticipantDto {
    sid: String,
    identity: String,
    state: String,
    metadata: String,
    joined_at: i64,
    tracks: Vec<TrackDto>,
}

#[derive(Serialize)]
struct TrackDto {
    sid: String,
    name: String,
    kind: String,
    muted: bool,
}

impl From<ParticipantInfo> for ParticipantDto {
    fn from(p: ParticipantInfo) -> Self {
        Self {
            sid: p.sid,
            identity: p.identity,
            state: p.state,
            metadata: p.metadata,
            joined_at: p.joined_at,
            tracks: p
                .tracks
                .into_iter()
                .map(|t| TrackDto {
                    sid: t.sid,
                    name: t.name,
                    kind: t.kind,
                    muted: t.muted,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTokenRequest {
    room_name: Option<String>,
    identity: Option<String>,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

async fn get_token_handler(
    State(state): State<SharedState>,
    Json(payload): Json<GetTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let identity = require(&payload.identity, "identity")?;

    let token = AccessToken::new(&state.config.rooms.api_key, &state.config.rooms.api_secret)
        .with_identity(identity)
        .with_grants(VideoGrants::join(room_name))
        .with_ttl_secs(state.config.rooms.token_ttl_secs)
        .to_jwt()
        .map_err(internal)?;

    Ok(Json(TokenResponse { token }))
}

// ── Room CRUD ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRequest {
    room_name: Option<String>,
}

async fn create_room_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RoomRequest>,
) -> Result<Json<RoomDto>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let room = state.rooms.create_room(room_name).await.map_err(internal)?;
    info!(room = %room.name, sid = %room.sid, "Room created");
    Ok(Json(room.into()))
}

#[derive(Serialize)]
struct ListRoomsResponse {
    rooms: Vec<RoomDto>,
}

async fn list_rooms_handler(
    State(state): State<SharedState>,
) -> Result<Json<ListRoomsResponse>, ApiError> {
    let rooms = state.rooms.list_rooms().await.map_err(internal)?;
    Ok(Json(ListRoomsResponse {
        rooms: rooms.into_iter().map(RoomDto::from).collect(),
    }))
}

async fn delete_room_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RoomRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    state.rooms.delete_room(room_name).await.map_err(internal)?;
    info!(room = %room_name, "Room deleted");
    Ok(Json(SuccessResponse { success: true }))
}

// ── Participants ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ListParticipantsResponse {
    participants: Vec<ParticipantDto>,
}

async fn list_participants_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RoomRequest>,
) -> Result<Json<ListParticipantsResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let participants = state
        .rooms
        .list_participants(room_name)
        .await
        .map_err(internal)?;
    Ok(Json(ListParticipantsResponse {
        participants: participants.into_iter().map(ParticipantDto::from).collect(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantRequest {
    room_name: Option<String>,
    identity: Option<String>,
}

async fn remove_participant_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ParticipantRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let identity = require(&payload.identity, "identity")?;
    state
        .rooms
        .remove_participant(room_name, identity)
        .await
        .map_err(internal)?;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParticipantRequest {
    room_name: Option<String>,
    identity: Option<String>,
    metadata: Option<String>,
    permissions: Option<PermissionsDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionsDto {
    #[serde(default)]
    can_subscribe: bool,
    #[serde(default)]
    can_publish: bool,
    #[serde(default)]
    can_publish_data: bool,
}

#[derive(Serialize)]
struct UpdateParticipantResponse {
    participant: ParticipantDto,
}

async fn update_participant_handler(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateParticipantRequest>,
) -> Result<Json<UpdateParticipantResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let identity = require(&payload.identity, "identity")?;

    let permissions = payload.permissions.map(|p| ParticipantPermissions {
        can_subscribe: p.can_subscribe,
        can_publish: p.can_publish,
        can_publish_data: p.can_publish_data,
    });

    let participant = state
        .rooms
        .update_participant(room_name, identity, payload.metadata.clone(), permissions)
        .await
        .map_err(internal)?;

    Ok(Json(UpdateParticipantResponse {
        participant: participant.into(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveParticipantRequest {
    room_name: Option<String>,
    identity: Option<String>,
    destination_room_name: Option<String>,
}

async fn move_participant_handler(
    State(state): State<SharedState>,
    Json(payload): Json<MoveParticipantRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let identity = require(&payload.identity, "identity")?;
    let destination = require(&payload.destination_room_name, "destinationRoomName")?;
    state
        .rooms
        .move_participant(room_name, identity, destination)
        .await
        .map_err(internal)?;
    info!(identity = %identity, from = %room_name, to = %destination, "Participant moved");
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MuteTrackRequest {
    room_name: Option<String>,
    identity: Option<String>,
    track_sid: Option<String>,
    muted: Option<bool>,
}

async fn mute_track_handler(
    State(state): State<SharedState>,
    Json(payload): Json<MuteTrackRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let identity = require(&payload.identity, "identity")?;
    let track_sid = require(&payload.track_sid, "trackSid")?;
    let muted = payload
        .muted
        .ok_or_else(|| bad_request("muted is required."))?;
    state
        .rooms
        .mute_track(room_name, identity, track_sid, muted)
        .await
        .map_err(internal)?;
    Ok(Json(SuccessResponse { success: true }))
}

// ── Username availability ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckUsernameRequest {
    room_name: Option<String>,
    username: Option<String>,
}

#[derive(Serialize)]
struct CheckUsernameResponse {
    available: bool,
    message: String,
}

async fn check_username_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CheckUsernameRequest>,
) -> Result<Json<CheckUsernameResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let username = require(&payload.username, "username")?;

    // A room that doesn't exist yet has no occupants; the name is free.
    let taken = match state.rooms.list_participants(room_name).await {
        Ok(participants) => participants.iter().any(|p| p.identity == username),
        Err(roomrelay_core::RoomError::RoomNotFound(_)) => false,
        Err(e) => return Err(internal(e)),
    };

    Ok(Json(CheckUsernameResponse {
        available: !taken,
        message: if taken {
            format!("\"{username}\" is already in use in this room.")
        } else {
            format!("\"{username}\" is available.")
        },
    }))
}

// ── Join ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomRequest {
    room_name: Option<String>,
    username: Option<String>,
}

#[derive(Serialize)]
struct JoinRoomResponse {
    success: bool,
    greeting: String,
    room: RoomDto,
}

async fn join_room_handler(
    State(state): State<SharedState>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, ApiError> {
    let room_name = require(&payload.room_name, "roomName")?;
    let username = require(&payload.username, "username")?;

    // Creation is idempotent platform-side; this doubles as "ensure exists".
    let room = state.rooms.create_room(room_name).await.map_err(internal)?;
    let greeting = state.greeter.greet(username, room_name).await;

    info!(username = %username, room = %room_name, "Participant joining");

    Ok(Json(JoinRoomResponse {
        success: true,
        greeting,
        room: room.into(),
    }))
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: Option<String>,
    username: Option<String>,
    room_name: Option<String>,
    #[serde(default)]
    chat_messages: Vec<ChatMessageDto>,
}

#[derive(Deserialize)]
struct ChatMessageDto {
    #[serde(default = "default_role")]
    role: String,
    content: String,
}

fn default_role() -> String {
    "user".into()
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = require(&payload.message, "message")?;
    let username = require(&payload.username, "username")?;
    let room_name = require(&payload.room_name, "roomName")?;

    let recent: Vec<ConversationTurn> = payload
        .chat_messages
        .iter()
        .map(|m| match m.role.as_str() {
            "assistant" => ConversationTurn::assistant(&m.content),
            _ => ConversationTurn::user(&m.content),
        })
        .collect();

    info!(username = %username, room = %room_name, history = recent.len(), "Chat turn");

    let response = state
        .chat
        .respond(message, username, room_name, &recent)
        .await
        .map_err(internal)?;

    Ok(Json(ChatResponse { response }))
}
