//! Non-streaming chat completion over an OpenAI-compatible endpoint.
//!
//! The retrieval pipeline hands this a fully assembled message list; the
//! adapter only moves it over the wire. Streaming responses are deliberately
//! not requested and not parsed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lectern_core::config::ModelSettings;
use lectern_core::error::{Error, Result};
use lectern_core::traits::ChatModel;
use lectern_core::types::ChatMessage;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

pub struct OpenAiChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiChat {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let base = crate::normalize_base_url(&settings.base_url);
        Ok(Self {
            client: crate::build_http_client(settings.timeout_secs)?,
            url: format!("{base}/chat/completions"),
            api_key: settings.api_key.clone(),
            model: settings.chat_model.clone(),
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if messages.is_empty() {
            return Err(Error::InvalidInput(
                "chat requires at least one message".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                max_tokens: self.max_tokens,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::chat_retryable(e)
                } else {
                    Error::chat(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = format!("{status}: {}", body.trim());
            if status.is_server_error() {
                return Err(Error::chat_retryable(reason));
            }
            return Err(Error::chat(reason));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::chat(format!("malformed response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::chat("response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_matches_the_wire_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let body = serde_json::to_value(ChatRequest {
            model: "chat-model",
            messages: &messages,
            max_tokens: 800,
        })
        .expect("serialize");
        assert_eq!(
            body,
            json!({
                "model": "chat-model",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ],
                "max_tokens": 800
            })
        );
    }

    #[test]
    fn first_choice_content_is_the_answer() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "id": "cmpl-1",
            "choices": [
                {
                    "index": 0,
                    "finish_reason": "stop",
                    "message": { "role": "assistant", "content": "the answer" }
                }
            ]
        }))
        .expect("deserialize");
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .expect("one choice");
        assert_eq!(content, "the answer");
    }
}
