//! Control-plane HTTP client.
//!
//! The platform exposes its RoomService over Twirp: JSON POSTs to
//! `/twirp/livekit.RoomService/<Method>`, authenticated with a short-lived
//! admin JWT. Every trait method is one call; there is no retry or
//! composition logic here.

use async_trait::async_trait;
use roomrelay_config::RoomsConfig;
use roomrelay_core::error::RoomError;
use roomrelay_core::rooms::{
    ParticipantInfo, ParticipantPermissions, RoomControl, RoomInfo, TrackInfo,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::token::{AccessToken, VideoGrants};

/// Lifetime of per-request admin tokens.
const ADMIN_TOKEN_TTL_SECS: u64 = 10 * 60;

/// Twirp RoomService client.
pub struct RoomServiceClient {
    config: RoomsConfig,
    base_url: String,
    client: reqwest::Client,
}

impl RoomServiceClient {
    pub fn new(config: RoomsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        // Deployments often configure the signaling URL (ws/wss); the
        // control plane lives at the same host over http/https.
        let base_url = config
            .url
            .trim_end_matches('/')
            .replacen("wss://", "https://", 1)
            .replacen("ws://", "http://", 1);

        Self {
            config,
            base_url,
            client,
        }
    }

    fn admin_jwt(&self) -> Result<String, RoomError> {
        AccessToken::new(&self.config.api_key, &self.config.api_secret)
            .with_identity("roomrelay-control")
            .with_grants(VideoGrants::admin())
            .with_ttl_secs(ADMIN_TOKEN_TTL_SECS)
            .to_jwt()
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, RoomError> {
        let url = format!("{}/twirp/livekit.RoomService/{method}", self.base_url);
        let jwt = self.admin_jwt()?;

        debug!(method, "Room service call");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {jwt}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RoomError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = response.text().await.unwrap_or_default();
            // Twirp errors are JSON {code, msg}; surface not_found distinctly.
            if let Ok(twirp) = serde_json::from_str::<TwirpError>(&text)
                && twirp.code == "not_found"
            {
                return Err(RoomError::RoomNotFound(twirp.msg));
            }
            return Err(RoomError::ApiError {
                status_code: status,
                message: text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RoomError::Network(format!("Malformed response: {e}")))
    }
}

#[async_trait]
impl RoomControl for RoomServiceClient {
    async fn create_room(&self, name: &str) -> Result<RoomInfo, RoomError> {
        self.call(
            "CreateRoom",
            json!({
                "name": name,
                "emptyTimeout": self.config.empty_timeout_secs,
                "maxParticipants": self.config.max_participants,
            }),
        )
        .await
    }

    async fn delete_room(&self, name: &str) -> Result<(), RoomError> {
        let _: serde_json::Value = self.call("DeleteRoom", json!({ "room": name })).await?;
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<RoomInfo>, RoomError> {
        let response: ListRoomsResponse = self.call("ListRooms", json!({})).await?;
        Ok(response.rooms)
    }

    async fn list_participants(&self, room: &str) -> Result<Vec<ParticipantInfo>, RoomError> {
        let response: ListParticipantsResponse =
            self.call("ListParticipants", json!({ "room": room })).await?;
        Ok(response.participants)
    }

    async fn get_participant(
        &self,
        room: &str,
        identity: &str,
    ) -> Result<ParticipantInfo, RoomError> {
        self.call(
            "GetParticipant",
            json!({ "room": room, "identity": identity }),
        )
        .await
        .map_err(|e| match e {
            RoomError::RoomNotFound(_) => RoomError::ParticipantNotFound {
                room: room.into(),
                identity: identity.into(),
            },
            other => other,
        })
    }

    async fn remove_participant(&self, room: &str, identity: &str) -> Result<(), RoomError> {
        let _: serde_json::Value = self
            .call(
                "RemoveParticipant",
                json!({ "room": room, "identity": identity }),
            )
            .await?;
        Ok(())
    }

    async fn move_participant(
        &self,
        room: &str,
        identity: &str,
        destination: &str,
    ) -> Result<(), RoomError> {
        let _: serde_json::Value = self
            .call(
                "MoveParticipant",
                json!({
                    "room": room,
                    "identity": identity,
                    "destinationRoom": destination,
                }),
            )
            .await?;
        Ok(())
    }

    async fn update_participant(
        &self,
        room: &str,
        identity: &str,
        metadata: Option<String>,
        permissions: Option<ParticipantPermissions>,
    ) -> Result<ParticipantInfo, RoomError> {
        let mut body = json!({ "room": room, "identity": identity });
        if let Some(metadata) = metadata {
            body["metadata"] = json!(metadata);
        }
        if let Some(permissions) = permissions {
            body["permission"] = serde_json::to_value(permissions)
                .map_err(|e| RoomError::Network(e.to_string()))?;
        }
        self.call("UpdateParticipant", body).await
    }

    async fn mute_track(
        &self,
        room: &str,
        identity: &str,
        track_sid: &str,
        muted: bool,
    ) -> Result<(), RoomError> {
        let _: MuteTrackResponse = self
            .call(
                "MutePublishedTrack",
                json!({
                    "room": room,
                    "identity": identity,
                    "trackSid": track_sid,
                    "muted": muted,
                }),
            )
            .await?;
        Ok(())
    }
}

// --- Wire types ---

#[derive(Deserialize)]
struct TwirpError {
    code: String,
    msg: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListRoomsResponse {
    rooms: Vec<RoomInfo>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListParticipantsResponse {
    participants: Vec<ParticipantInfo>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
#[allow(dead_code)]
struct MuteTrackResponse {
    track: Option<TrackInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> RoomsConfig {
        RoomsConfig {
            url: url.into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            ..RoomsConfig::default()
        }
    }

    #[test]
    fn signaling_url_is_rewritten_to_http() {
        let client = RoomServiceClient::new(test_config("wss://example.livekit.cloud/"));
        assert_eq!(client.base_url, "https://example.livekit.cloud");

        let client = RoomServiceClient::new(test_config("http://localhost:7880"));
        assert_eq!(client.base_url, "http://localhost:7880");
    }

    #[test]
    fn twirp_not_found_parses() {
        let err: TwirpError =
            serde_json::from_str(r#"{"code":"not_found","msg":"room does not exist"}"#).unwrap();
        assert_eq!(err.code, "not_found");
    }

    #[tokio::test]
    async fn unreachable_platform_maps_to_network_error() {
        let client = RoomServiceClient::new(test_config("http://127.0.0.1:1"));
        let result = client.list_rooms().await;
        assert!(matches!(result, Err(RoomError::Network(_))));
    }
}
