use crate::error::Result;
use crate::types::ChatMessage;
use async_trait::async_trait;

/// Converts one text into a fixed-length embedding vector.
///
/// Implementations reject empty input before doing any work and produce
/// vectors of a constant length for the lifetime of the instance.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the backing model, for logs and reports.
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Non-streaming chat completion call: full message list in, answer text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
