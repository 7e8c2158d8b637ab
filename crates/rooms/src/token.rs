//! Access-token signing.
//!
//! The platform authenticates joins with a short-lived HS256 JWT carrying
//! video grants. Built with the builder pattern the platform SDKs use:
//! identity, grants, ttl, then `to_jwt()`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use roomrelay_core::error::RoomError;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Video grants embedded in an access token.
///
/// Field names follow the platform's claim schema, hence camelCase on the
/// wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrants {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub room_join: bool,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub room: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub room_create: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub room_list: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub room_admin: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_publish: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_subscribe: bool,
}

impl VideoGrants {
    /// Grants for a participant joining a named room.
    pub fn join(room: impl Into<String>) -> Self {
        Self {
            room_join: true,
            room: room.into(),
            can_publish: true,
            can_subscribe: true,
            ..Self::default()
        }
    }

    /// Grants for control-plane (admin) calls.
    pub fn admin() -> Self {
        Self {
            room_create: true,
            room_list: true,
            room_admin: true,
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    iat: i64,
    nbf: i64,
    exp: i64,
    video: &'a VideoGrants,
}

/// A signed access token under construction.
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    identity: String,
    grants: VideoGrants,
    ttl_secs: u64,
}

impl AccessToken {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            identity: String::new(),
            grants: VideoGrants::default(),
            ttl_secs: 6 * 60 * 60,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_grants(mut self, grants: VideoGrants) -> Self {
        self.grants = grants;
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Sign and serialize the token.
    pub fn to_jwt(&self) -> Result<String, RoomError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &self.api_key,
            sub: &self.identity,
            iat: now,
            nbf: now,
            exp: now + self.ttl_secs as i64,
            video: &self.grants,
        };

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| RoomError::TokenSigning(format!("claims serialization: {e}")))?,
        );
        let signing_input = format!("{header}.{payload}");

        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| RoomError::TokenSigning(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_payload(jwt: &str) -> serde_json::Value {
        let payload = jwt.split('.').nth(1).unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(payload).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn jwt_has_three_segments() {
        let jwt = AccessToken::new("key", "secret")
            .with_identity("alice")
            .with_grants(VideoGrants::join("lobby"))
            .to_jwt()
            .unwrap();
        assert_eq!(jwt.split('.').count(), 3);
    }

    #[test]
    fn join_token_carries_identity_and_room() {
        let jwt = AccessToken::new("key", "secret")
            .with_identity("alice")
            .with_grants(VideoGrants::join("lobby"))
            .with_ttl_secs(3600)
            .to_jwt()
            .unwrap();
        let claims = decode_payload(&jwt);
        assert_eq!(claims["iss"], "key");
        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["video"]["room"], "lobby");
        assert_eq!(claims["video"]["roomJoin"], true);
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            3600
        );
    }

    #[test]
    fn admin_token_omits_join_grants() {
        let jwt = AccessToken::new("key", "secret")
            .with_identity("control-plane")
            .with_grants(VideoGrants::admin())
            .to_jwt()
            .unwrap();
        let claims = decode_payload(&jwt);
        assert_eq!(claims["video"]["roomAdmin"], true);
        assert!(claims["video"].get("roomJoin").is_none());
    }

    #[test]
    fn signature_depends_on_secret() {
        let make = |secret: &str| {
            AccessToken::new("key", secret)
                .with_identity("alice")
                .to_jwt()
                .unwrap()
        };
        let sig = |jwt: String| jwt.split('.').nth(2).unwrap().to_string();
        assert_ne!(sig(make("one")), sig(make("two")));
    }
}
