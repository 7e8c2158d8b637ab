//! HTTP client for the external memory service.
//!
//! The service exposes two operations: a relevance-scored search over a
//! partition, and an append of new turns into a partition. Partition keys
//! are exact-match identifiers — the room-scoped `username::room` key or the
//! bare username.
//!
//! Field contract: the service reports remembered text under `text` and the
//! match strength under `score`. Earlier revisions of the service used
//! `memory` for the text field; this client standardizes on `text`.

use async_trait::async_trait;
use roomrelay_core::error::MemoryError;
use roomrelay_core::memory::{MemoryHit, MemoryStore, WriteMetadata};
use roomrelay_core::message::ConversationTurn;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// HTTP-backed memory store.
pub struct HttpMemoryStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpMemoryStore {
    /// Create a new client with a bounded request timeout. The timeout is
    /// the only cancellation mechanism memory calls need: on expiry the
    /// caller sees an ordinary lookup failure.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    fn map_status(status: u16, body: String) -> MemoryError {
        match status {
            401 | 403 => MemoryError::AuthenticationFailed(body),
            _ => MemoryError::Unavailable(format!("status {status}: {body}")),
        }
    }
}

#[async_trait]
impl MemoryStore for HttpMemoryStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(
        &self,
        query: &str,
        partition: &str,
        limit: usize,
    ) -> std::result::Result<Vec<MemoryHit>, MemoryError> {
        let url = format!("{}/v1/memories/search/", self.base_url);
        let body = SearchRequest {
            query,
            user_id: partition,
            limit,
        };

        debug!(partition = %partition, limit, "Memory search");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MemoryError::Timeout(e.to_string())
                } else {
                    MemoryError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| MemoryError::SearchFailed(format!("Malformed search response: {e}")))?;

        Ok(results
            .into_iter()
            .map(|r| MemoryHit {
                text: r.text,
                score: r.score,
            })
            .collect())
    }

    async fn add(
        &self,
        turns: &[ConversationTurn],
        partition: &str,
        metadata: &WriteMetadata,
    ) -> std::result::Result<(), MemoryError> {
        let url = format!("{}/v1/memories/", self.base_url);
        let body = AddRequest {
            messages: turns,
            user_id: partition,
            metadata: AddMetadata {
                room: &metadata.room,
                username: &metadata.username,
                category: &metadata.category,
            },
        };

        debug!(partition = %partition, turns = turns.len(), "Memory write");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MemoryError::Timeout(e.to_string())
                } else {
                    MemoryError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::WriteFailed(format!("status {status}: {body}")));
        }

        Ok(())
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    user_id: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct SearchResult {
    text: String,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    messages: &'a [ConversationTurn],
    user_id: &'a str,
    metadata: AddMetadata<'a>,
}

#[derive(Serialize)]
struct AddMetadata<'a> {
    room: &'a str,
    username: &'a str,
    category: &'a str,
}
