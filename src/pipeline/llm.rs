//! Extraction model invocation.
//!
//! The orchestrator only sees the [`CompletionService`] trait: one request
//! in, the raw completion text out. [`LlmCompletionService`] implements it on
//! top of an `edgequake-llm` provider. There is no retry loop here; a failed
//! call is reported once as [`AnalysisError::ExtractionFailed`] with the
//! provider's message.
//!
//! ## Message layout
//!
//! A single user message:
//! * text input: the prompt with the paper text appended
//! * PDF input: the prompt plus the PDF as a base64 inline attachment

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::acquire::NormalizedPayload;
use crate::pipeline::encode::encode_document;
use crate::prompts::with_paper_text;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A binary document sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Everything the model needs for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Final prompt text; for text input the paper is already appended.
    pub prompt: String,
    pub attachment: Option<Attachment>,
}

impl ExtractionRequest {
    /// Combine the built prompt with the acquired payload.
    pub fn from_payload(prompt: String, payload: NormalizedPayload) -> Self {
        match payload {
            NormalizedPayload::Binary { data, mime_type } => Self {
                prompt,
                attachment: Some(Attachment { data, mime_type }),
            },
            NormalizedPayload::Text(text) => Self {
                prompt: with_paper_text(&prompt, &text),
                attachment: None,
            },
        }
    }
}

/// The extraction model, seen from the pipeline.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one request and return the model's raw text.
    async fn complete(&self, request: &ExtractionRequest) -> Result<String, AnalysisError>;
}

/// [`CompletionService`] backed by an `edgequake-llm` provider.
pub struct LlmCompletionService {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmCompletionService {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionService for LlmCompletionService {
    async fn complete(&self, request: &ExtractionRequest) -> Result<String, AnalysisError> {
        let start = Instant::now();
        let messages = vec![build_message(request)];
        let options = build_options(self.temperature, self.max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| AnalysisError::ExtractionFailed {
                message: e.to_string(),
            })?;

        debug!(
            "Extraction: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

fn build_message(request: &ExtractionRequest) -> ChatMessage {
    match &request.attachment {
        Some(doc) => ChatMessage::user_with_images(
            request.prompt.as_str(),
            vec![encode_document(&doc.data, &doc.mime_type)],
        ),
        None => ChatMessage::user(request.prompt.as_str()),
    }
}

fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}
