//! Error types for the roomrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum.
//!
//! The propagation policy is asymmetric on purpose: completion failures
//! surface to the HTTP boundary (without a completion there is nothing to
//! return), while memory failures are always absorbed at the point of use
//! and degrade to empty-context behavior.

use thiserror::Error;

/// The top-level error type for all roomrelay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion service errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Memory service errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Room platform errors ---
    #[error("Room error: {0}")]
    Room(#[from] RoomError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures from the downstream completion service. These are the one error
/// class that propagates to the HTTP boundary.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by completion service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures from the external memory service. Recovered locally wherever
/// they occur — a failed lookup degrades to an empty result set.
#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Memory service unavailable: {0}")]
    Unavailable(String),

    #[error("Memory search failed: {0}")]
    SearchFailed(String),

    #[error("Memory write failed: {0}")]
    WriteFailed(String),

    #[error("Memory request timed out: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// Failures from the room platform's control-plane API.
#[derive(Debug, Clone, Error)]
pub enum RoomError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Participant not found: {identity} in {room}")]
    ParticipantNotFound { room: String, identity: String },

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_displays_correctly() {
        let err = Error::Completion(CompletionError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn room_error_displays_correctly() {
        let err = Error::Room(RoomError::ParticipantNotFound {
            room: "lobby".into(),
            identity: "alice".into(),
        });
        assert!(err.to_string().contains("lobby"));
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn memory_error_wraps_into_top_level() {
        let err: Error = MemoryError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, Error::Memory(_)));
    }
}
