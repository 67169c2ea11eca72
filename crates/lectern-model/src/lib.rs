#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chat;
pub mod hash;
pub mod remote;

use std::time::Duration;

use lectern_core::config::Settings;
use lectern_core::error::{Error, Result};
use lectern_core::traits::{ChatModel, Embedder};

/// Build the embedding backend selected by configuration.
///
/// `LECTERN_USE_HASH_EMBEDDINGS=1` forces the offline hash backend no
/// matter what the settings say, which keeps tests and air-gapped runs off
/// the network.
pub fn embedder_from_config(settings: &Settings) -> Result<Box<dyn Embedder>> {
    let force_hash = std::env::var("LECTERN_USE_HASH_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if force_hash || settings.embedding.provider == "hash" {
        tracing::info!(dims = settings.embedding.hash_dims, "using hash embedder");
        return Ok(Box::new(hash::HashEmbedder::new(settings.embedding.hash_dims)));
    }
    Ok(Box::new(remote::OpenAiEmbedder::new(&settings.model)?))
}

/// Build the chat-completion client for the configured endpoint.
pub fn chat_from_config(settings: &Settings) -> Result<Box<dyn ChatModel>> {
    Ok(Box::new(chat::OpenAiChat::new(&settings.model)?))
}

/// Empty input is refused before any work happens, network included.
pub(crate) fn ensure_embeddable(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("cannot embed empty text".to_string()));
    }
    Ok(())
}

/// Accepts a base that may point at a full chat endpoint (a habit of
/// desktop model settings) and trims it down to the API base.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_chat = trimmed.strip_suffix("/chat/completions").unwrap_or(trimmed);
    without_chat.trim_end_matches('/').to_string()
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))
}
