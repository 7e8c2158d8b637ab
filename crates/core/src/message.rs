//! Conversation domain types.
//!
//! A chat request carries an ordered sequence of turns. Turns are immutable
//! value objects: the assembler builds a fresh window from them per request,
//! nothing is persisted by this system.

use serde::{Deserialize, Serialize};

/// The role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (fixed prompt + injected context)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,
}

impl ConversationTurn {
    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = ConversationTurn::user("Hello, room!");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hello, room!");
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = ConversationTurn::assistant("hi");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"assistant\""));
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = ConversationTurn::system("Be helpful.");
        let json = serde_json::to_string(&turn).unwrap();
        let back: ConversationTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
