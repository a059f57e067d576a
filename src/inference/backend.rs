use thiserror::Error;

use crate::task::{Message, SamplingParams};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to load model: {0}")]
    Load(#[source] anyhow::Error),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("model execution failed: {0}")]
    Inference(#[source] anyhow::Error),
    #[error("prompt rejected: {0}")]
    Template(String),
}

impl From<candle_core::Error> for BackendError {
    fn from(err: candle_core::Error) -> Self {
        BackendError::Inference(err.into())
    }
}

/// One generation call. Built fresh for every command and consumed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub max_new_tokens: usize,
    pub sampling: SamplingParams,

    /// End-of-sequence marker from the backend's vocabulary
    pub eos_marker: String,
}

/// Turns a message sequence into decoded text.
///
/// Implementations return only the continuation beyond the supplied messages, with
/// control tokens stripped. They are not expected to be reentrant; callers serialize access.
pub trait GenerationBackend {
    fn eos_marker(&self) -> &str;

    fn generate(&mut self, request: &GenerationRequest) -> Result<String, BackendError>;
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for Box<B> {
    fn eos_marker(&self) -> &str {
        (**self).eos_marker()
    }

    fn generate(&mut self, request: &GenerationRequest) -> Result<String, BackendError> {
        (**self).generate(request)
    }
}
