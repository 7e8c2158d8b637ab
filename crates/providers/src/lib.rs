//! Completion provider implementations for roomrelay.
//!
//! All providers implement the `roomrelay_core::CompletionProvider` trait.
//! The gateway holds exactly one, constructed from configuration at startup.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use roomrelay_config::CompletionConfig;
use roomrelay_core::CompletionProvider;
use std::sync::Arc;

/// Build the configured completion provider.
pub fn build_from_config(config: &CompletionConfig) -> Arc<dyn CompletionProvider> {
    Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.api_url,
        &config.api_key,
        config.request_timeout_secs,
    ))
}
