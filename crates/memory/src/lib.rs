//! Memory service clients for roomrelay.
//!
//! All stores implement the `roomrelay_core::MemoryStore` trait. The HTTP
//! client talks to the external service; the in-memory store backs tests;
//! the no-op store stands in when no service is configured, so the rest of
//! the system never has to special-case "memory disabled".

pub mod http;
pub mod in_memory;
pub mod noop;

pub use http::HttpMemoryStore;
pub use in_memory::InMemoryStore;
pub use noop::NoopMemoryStore;

use roomrelay_config::MemoryConfig;
use roomrelay_core::MemoryStore;
use std::sync::Arc;

/// Build the configured memory store. An empty API URL disables memory.
pub fn build_from_config(config: &MemoryConfig) -> Arc<dyn MemoryStore> {
    if config.api_url.is_empty() {
        tracing::info!("No memory service configured, long-term memory disabled");
        Arc::new(NoopMemoryStore)
    } else {
        Arc::new(HttpMemoryStore::new(
            &config.api_url,
            &config.api_key,
            config.request_timeout_secs,
        ))
    }
}
