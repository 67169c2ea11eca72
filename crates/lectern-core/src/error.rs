use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to extract text from '{artifact}': {reason}")]
    Extraction { artifact: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding request failed: {reason}")]
    Embedding { reason: String, retryable: bool },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index storage error: {0}")]
    IndexIo(String),

    #[error("Chat request failed: {reason}")]
    Chat { reason: String, retryable: bool },

    #[error("Ingestion of '{artifact}' failed: {source}")]
    Ingest {
        artifact: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn extraction(artifact: impl Into<String>, reason: impl ToString) -> Self {
        Self::Extraction {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub fn embedding(reason: impl ToString) -> Self {
        Self::Embedding {
            reason: reason.to_string(),
            retryable: false,
        }
    }

    /// Embedding failure worth re-running, such as a timeout or a dropped
    /// connection, as opposed to a rejected request.
    pub fn embedding_retryable(reason: impl ToString) -> Self {
        Self::Embedding {
            reason: reason.to_string(),
            retryable: true,
        }
    }

    pub fn chat(reason: impl ToString) -> Self {
        Self::Chat {
            reason: reason.to_string(),
            retryable: false,
        }
    }

    pub fn chat_retryable(reason: impl ToString) -> Self {
        Self::Chat {
            reason: reason.to_string(),
            retryable: true,
        }
    }

    pub fn index_io(reason: impl ToString) -> Self {
        Self::IndexIo(reason.to_string())
    }

    /// Wraps a step error with the artifact name it occurred on.
    pub fn ingest(artifact: impl Into<String>, source: Error) -> Self {
        Self::Ingest {
            artifact: artifact.into(),
            source: Box::new(source),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Embedding { retryable, .. } | Self::Chat { retryable, .. } => *retryable,
            Self::Ingest { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
