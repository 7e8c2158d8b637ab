//! The chat flow: assemble → complete → fire-and-forget persist.
//!
//! The completion call is the one failure that propagates — without a
//! completion there is nothing to return. Persistence happens strictly
//! after a successful completion; an aborted request never enqueues a
//! write because the handler future is dropped before reaching it.

use roomrelay_core::error::CompletionError;
use roomrelay_core::message::ConversationTurn;
use roomrelay_core::provider::{CompletionProvider, CompletionRequest};
use std::sync::Arc;

use crate::context::ContextAssembler;
use crate::writer::MemoryWriter;

/// Generation parameters, fixed process-wide at startup.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// The end-to-end chat orchestration.
pub struct ChatService {
    assembler: ContextAssembler,
    provider: Arc<dyn CompletionProvider>,
    writer: MemoryWriter,
    params: GenerationParams,
}

impl ChatService {
    pub fn new(
        assembler: ContextAssembler,
        provider: Arc<dyn CompletionProvider>,
        writer: MemoryWriter,
        params: GenerationParams,
    ) -> Self {
        Self {
            assembler,
            provider,
            writer,
            params,
        }
    }

    /// Run one chat turn and return the generated reply.
    pub async fn respond(
        &self,
        message: &str,
        username: &str,
        room: &str,
        recent_turns: &[ConversationTurn],
    ) -> Result<String, CompletionError> {
        let window = self
            .assembler
            .assemble(message, username, room, recent_turns)
            .await;

        let reply = self
            .provider
            .complete(CompletionRequest {
                model: self.params.model.clone(),
                messages: window.turns,
                temperature: self.params.temperature,
                max_tokens: self.params.max_tokens,
            })
            .await?;

        self.writer.persist(
            ConversationTurn::user(message),
            ConversationTurn::assistant(reply.clone()),
            username,
            room,
        );

        Ok(reply)
    }
}
