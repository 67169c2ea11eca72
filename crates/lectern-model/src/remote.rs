//! Remote embedding over an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lectern_core::config::ModelSettings;
use lectern_core::error::{Error, Result};
use lectern_core::traits::Embedder;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let base = crate::normalize_base_url(&settings.base_url);
        Ok(Self {
            client: crate::build_http_client(settings.timeout_secs)?,
            url: format!("{base}/embeddings"),
            api_key: settings.api_key.clone(),
            model: settings.embedding_model().to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        crate::ensure_embeddable(text)?;

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = format!("{status}: {}", body.trim());
            if status.is_server_error() {
                return Err(Error::embedding_retryable(reason));
            }
            return Err(Error::embedding(reason));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("malformed response: {e}")))?;
        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("response contained no embedding data"))?;
        if first.embedding.is_empty() {
            return Err(Error::embedding("response embedding was empty"));
        }
        Ok(first.embedding)
    }
}

fn classify_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::embedding_retryable(e)
    } else {
        Error::embedding(e)
    }
}
