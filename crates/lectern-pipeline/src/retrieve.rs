//! Retrieval: embed the question, fetch the nearest chunks, assemble the
//! augmented prompt and hand it to the chat model.

use std::sync::Arc;

use lectern_core::config::RetrievalSettings;
use lectern_core::error::{Error, Result};
use lectern_core::traits::{ChatModel, Embedder};
use lectern_core::types::{ChatMessage, SearchHit};
use lectern_index::VectorIndex;
use tokio::sync::Mutex;

/// Separator between retrieved chunks inside the context block.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

const SYSTEM_PROMPT: &str =
    "You are an assistant for a local document collection. Ground your \
     answers in the provided context when it is relevant.";

/// Policy for a failed embed or index lookup during a chat turn.
///
/// The failure is never swallowed: `Fail` propagates it, `BareQuestion`
/// still asks the model and reports the failure next to the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalFallback {
    Fail,
    BareQuestion,
}

/// A completed chat turn plus the retrieval evidence behind it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub hits: Vec<SearchHit>,
    /// Set when retrieval failed and the fallback produced the answer.
    pub retrieval_error: Option<String>,
}

pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    index: Arc<Mutex<VectorIndex>>,
    top_k: usize,
    fallback: RetrievalFallback,
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        index: Arc<Mutex<VectorIndex>>,
        settings: &RetrievalSettings,
        fallback: RetrievalFallback,
    ) -> Self {
        Self {
            embedder,
            chat,
            index,
            top_k: settings.top_k.max(1),
            fallback,
        }
    }

    /// Embeds `question` and returns the nearest chunks, most similar first.
    pub async fn retrieve(&self, question: &str, top_k: Option<usize>) -> Result<Vec<SearchHit>> {
        let embedding = self.embedder.embed(question).await?;
        let index = self.index.lock().await;
        index.query(&embedding, Some(top_k.unwrap_or(self.top_k)))
    }

    /// Answers `question` grounded in retrieved context.
    ///
    /// `history` is replayed between the system prompt and the augmented
    /// question, so multi-turn conversations keep their thread.
    pub async fn answer(&self, question: &str, history: &[ChatMessage]) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(Error::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let (hits, retrieval_error) = match self.retrieve(question, None).await {
            Ok(hits) => (hits, None),
            Err(err) => match self.fallback {
                RetrievalFallback::Fail => return Err(err),
                RetrievalFallback::BareQuestion => {
                    tracing::warn!(error = %err, "retrieval failed, answering without context");
                    (Vec::new(), Some(err.to_string()))
                }
            },
        };

        let prompt = augment_question(question, &hits);
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(prompt));

        let text = self.chat.complete(&messages).await?;
        Ok(Answer {
            text,
            hits,
            retrieval_error,
        })
    }
}

/// Builds the augmented prompt: instructions first, then the joined context
/// block, then the question verbatim. Without hits the bare question is
/// passed through unchanged.
pub fn augment_question(question: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return question.to_string();
    }
    let context = hits
        .iter()
        .map(|hit| hit.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);
    format!("Answer the question using the context below.\n{context}\n\nQuestion: {question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, content: &str) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            content: content.to_string(),
            distance: 0.0,
        }
    }

    #[test]
    fn augmented_prompt_keeps_instruction_context_question_order() {
        let prompt = augment_question(
            "where is the cabin?",
            &[hit("a#0", "first"), hit("a#1", "second")],
        );
        let instructions = prompt.find("Answer the question").unwrap();
        let context = prompt.find("first\n---\nsecond").unwrap();
        let question = prompt.find("Question: where is the cabin?").unwrap();
        assert!(instructions < context && context < question);
        assert!(prompt.ends_with("where is the cabin?"));
    }

    #[test]
    fn no_hits_passes_the_bare_question_through() {
        assert_eq!(augment_question("anyone there?", &[]), "anyone there?");
    }
}
