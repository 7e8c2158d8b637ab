//! Room platform client for roomrelay.
//!
//! Two concerns live here: signing access tokens that let a browser client
//! join a room directly against the platform, and the control-plane HTTP
//! client implementing `roomrelay_core::RoomControl`.

pub mod client;
pub mod token;

pub use client::RoomServiceClient;
pub use token::{AccessToken, VideoGrants};

use roomrelay_config::RoomsConfig;
use roomrelay_core::RoomControl;
use std::sync::Arc;

/// Build the configured room platform client.
pub fn build_from_config(config: &RoomsConfig) -> Arc<dyn RoomControl> {
    Arc::new(RoomServiceClient::new(config.clone()))
}
