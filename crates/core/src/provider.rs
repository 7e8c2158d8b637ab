//! CompletionProvider trait — the abstraction over the downstream
//! chat-completion service.
//!
//! A provider translates an assembled prompt window into generated text.
//! It is purely request/response: no retries, no state, no side effects
//! beyond the outbound call. One model identifier is configured
//! process-wide.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::message::ConversationTurn;

/// A completion request: the assembled window plus generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "llama-3.3-70b-versatile", "gpt-4o-mini")
    pub model: String,

    /// The ordered prompt window
    pub messages: Vec<ConversationTurn>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// The core CompletionProvider trait.
///
/// The chat handler calls `complete()` without knowing which backend is
/// configured — pure polymorphism.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "groq").
    fn name(&self) -> &str;

    /// Send the assembled window and get the generated reply text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, CompletionError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }
}
