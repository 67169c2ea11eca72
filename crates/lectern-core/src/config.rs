//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `lectern.toml` +
//! `lectern.<env>.toml` (selected by `RUST_ENV`) + `LECTERN_*` env vars
//! (nested keys via `__`, e.g. `LECTERN_MODEL__API_KEY`). Provides helpers
//! to expand `~` and `${VAR}` and to resolve relative paths against a known
//! base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Remote endpoint settings shared by the embedding and chat clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// OpenAI-compatible API base. A full `.../chat/completions` URL is
    /// accepted here and trimmed down to its base by the clients.
    pub base_url: String,
    /// Bearer token; in practice supplied via `LECTERN_MODEL__API_KEY`.
    pub api_key: String,
    pub chat_model: String,
    /// Embedding model name; empty means "use `chat_model`".
    pub embed_model: String,
    /// Request timeout applied to every embedding and chat call.
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            chat_model: "gpt-4o-mini".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
            max_tokens: 800,
        }
    }
}

impl ModelSettings {
    /// Model name used for embedding requests, falling back to the chat
    /// model when no dedicated embedding model is configured.
    pub fn embedding_model(&self) -> &str {
        if self.embed_model.is_empty() {
            &self.chat_model
        } else {
            &self.embed_model
        }
    }
}

/// Which embedding backend to construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `"openai"` (remote, OpenAI-compatible) or `"hash"` (offline,
    /// deterministic).
    pub provider: String,
    /// Vector length of the hash backend.
    pub hash_dims: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            hash_dims: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// SQLite file backing the vector index; `~` and `$VAR` are expanded.
    pub path: String,
    pub collection: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: "./data/lectern.db".to_string(),
            collection: "documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Chunk length in characters.
    pub chunk_size: usize,
    /// Chunks embedded in flight at once; 1 means strictly sequential.
    pub embed_concurrency: usize,
    /// Extensions accepted when ingesting a directory.
    pub extensions: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            embed_concurrency: 1,
            extensions: vec!["txt".to_string(), "md".to_string(), "pdf".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// How many chunks a question retrieves by default.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub ingest: IngestSettings,
    pub retrieval: RetrievalSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment =
            Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("lectern.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("lectern.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("lectern.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("lectern.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("LECTERN_").split("__"));

        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "ingest.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.ingest.embed_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "ingest.embed_concurrency must be at least 1".to_string(),
            ));
        }
        match self.embedding.provider.as_str() {
            "openai" | "hash" => {}
            other => {
                return Err(Error::InvalidConfig(format!(
                    "unknown embedding provider '{other}' (expected \"openai\" or \"hash\")"
                )));
            }
        }
        if self.embedding.hash_dims == 0 {
            return Err(Error::InvalidConfig(
                "embedding.hash_dims must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Index path with `~`/`$VAR` forms expanded.
    pub fn index_path(&self) -> PathBuf {
        expand_path(&self.index.path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
