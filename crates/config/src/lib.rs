//! Configuration loading, validation, and management for roomrelay.
//!
//! Loads configuration from `roomrelay.toml` (path overridable via
//! `ROOMRELAY_CONFIG`) with environment variable overrides for every
//! secret and endpoint. Validates all settings at startup; clients are
//! constructed once from the validated config and shared read-only
//! thereafter.

use roomrelay_core::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The root configuration structure.
///
/// Maps directly to `roomrelay.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Room platform (control plane + token signing)
    #[serde(default)]
    pub rooms: RoomsConfig,

    /// Completion service
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Long-term memory service
    #[serde(default)]
    pub memory: MemoryConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat orchestration knobs
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RoomsConfig {
    /// Platform control-plane base URL (e.g., "https://myproject.livekit.cloud")
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub api_secret: String,

    /// Seconds an empty room lingers before the platform closes it
    #[serde(default = "default_empty_timeout_secs")]
    pub empty_timeout_secs: u32,

    #[serde(default = "default_max_participants")]
    pub max_participants: u32,

    /// Lifetime of issued access tokens
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_upstream_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_empty_timeout_secs() -> u32 {
    600
}
fn default_max_participants() -> u32 {
    20
}
fn default_token_ttl_secs() -> u64 {
    6 * 60 * 60
}
fn default_upstream_timeout_secs() -> u64 {
    10
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            empty_timeout_secs: default_empty_timeout_secs(),
            max_participants: default_max_participants(),
            token_ttl_secs: default_token_ttl_secs(),
            request_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_completion_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_completion_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_completion_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_completion_timeout_secs() -> u64 {
    60
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: default_completion_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_completion_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Memory service base URL; empty disables memory entirely
    #[serde(default)]
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Result cap for the room-scoped lookup
    #[serde(default = "default_room_limit")]
    pub room_limit: usize,

    /// Result cap for the user-scoped lookup
    #[serde(default = "default_user_limit")]
    pub user_limit: usize,

    /// Retained snippets after merge/rank
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,

    /// Records scoring at or below this are dropped
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Capacity of the fire-and-forget write queue
    #[serde(default = "default_write_queue_capacity")]
    pub write_queue_capacity: usize,

    #[serde(default = "default_memory_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_room_limit() -> usize {
    5
}
fn default_user_limit() -> usize {
    3
}
fn default_max_snippets() -> usize {
    5
}
fn default_min_score() -> f32 {
    0.5
}
fn default_write_queue_capacity() -> usize {
    256
}
fn default_memory_timeout_secs() -> u64 {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            room_limit: default_room_limit(),
            user_limit: default_user_limit(),
            max_snippets: default_max_snippets(),
            min_score: default_min_score(),
            write_queue_capacity: default_write_queue_capacity(),
            request_timeout_secs: default_memory_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Fixed-window rate limit, requests per minute per client
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: usize,

    /// CORS origin allowed to call the gateway
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_rate_limit() -> usize {
    60
}
fn default_allowed_origin() -> String {
    "http://localhost:3000".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit_per_minute: default_rate_limit(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Recent turns carried into the prompt window
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Base system instruction for the assistant
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_history_window() -> usize {
    10
}
fn default_system_prompt() -> String {
    "You are a helpful assistant participating in a group chat room. \
     Keep replies concise and conversational."
        .into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &str) -> &'static str {
    if s.is_empty() { "None" } else { "[REDACTED]" }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("rooms", &self.rooms)
            .field("completion", &self.completion)
            .field("memory", &self.memory)
            .field("gateway", &self.gateway)
            .field("chat", &self.chat)
            .finish()
    }
}

impl std::fmt::Debug for RoomsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomsConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("empty_timeout_secs", &self.empty_timeout_secs)
            .field("max_participants", &self.max_participants)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("room_limit", &self.room_limit)
            .field("user_limit", &self.user_limit)
            .field("max_snippets", &self.max_snippets)
            .field("min_score", &self.min_score)
            .field("write_queue_capacity", &self.write_queue_capacity)
            .finish()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("allowed_origin", &self.allowed_origin)
            .finish()
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("history_window", &self.history_window)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish()
    }
}

impl AppConfig {
    /// Load configuration: TOML file if present, then environment overrides.
    pub fn load() -> Result<Self, Error> {
        let path = std::env::var("ROOMRELAY_CONFIG").unwrap_or_else(|_| "roomrelay.toml".into());
        let mut config = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| Error::Config {
                message: format!("Failed to read {path}: {e}"),
            })?;
            toml::from_str(&raw).map_err(|e| Error::Config {
                message: format!("Failed to parse {path}: {e}"),
            })?
        } else {
            tracing::debug!(path = %path, "No config file found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides. Secrets are expected to arrive
    /// this way in deployment; the TOML file carries the non-secret knobs.
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 8] = [
            ("LIVEKIT_URL", &mut self.rooms.url),
            ("LIVEKIT_API_KEY", &mut self.rooms.api_key),
            ("LIVEKIT_API_SECRET", &mut self.rooms.api_secret),
            ("COMPLETION_API_URL", &mut self.completion.api_url),
            ("COMPLETION_API_KEY", &mut self.completion.api_key),
            ("COMPLETION_MODEL", &mut self.completion.model),
            ("MEMORY_API_URL", &mut self.memory.api_url),
            ("MEMORY_API_KEY", &mut self.memory.api_key),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *slot = value;
            }
        }
    }

    /// Validate settings required to serve traffic. Memory is optional
    /// (empty URL disables it); rooms and completion are not.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rooms.url.is_empty() {
            return Err(Error::Config {
                message: "rooms.url is required (or set LIVEKIT_URL)".into(),
            });
        }
        if self.rooms.api_key.is_empty() || self.rooms.api_secret.is_empty() {
            return Err(Error::Config {
                message: "rooms.api_key and rooms.api_secret are required \
                          (or set LIVEKIT_API_KEY / LIVEKIT_API_SECRET)"
                    .into(),
            });
        }
        if self.completion.api_key.is_empty() {
            return Err(Error::Config {
                message: "completion.api_key is required (or set COMPLETION_API_KEY)".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.memory.min_score) {
            return Err(Error::Config {
                message: format!(
                    "memory.min_score must be within [0, 1], got {}",
                    self.memory.min_score
                ),
            });
        }
        if self.chat.history_window == 0 {
            return Err(Error::Config {
                message: "chat.history_window must be at least 1".into(),
            });
        }
        // Must be a valid header value: the gateway echoes it in CORS headers.
        if self.gateway.allowed_origin.is_empty()
            || !self
                .gateway
                .allowed_origin
                .chars()
                .all(|c| c.is_ascii_graphic())
        {
            return Err(Error::Config {
                message: format!(
                    "gateway.allowed_origin is not a valid origin: {:?}",
                    self.gateway.allowed_origin
                ),
            });
        }
        Ok(())
    }

    /// Whether the memory service is configured at all.
    pub fn memory_enabled(&self) -> bool {
        !self.memory.api_url.is_empty()
    }
}
