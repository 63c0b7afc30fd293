//! Chat completion through `edgequake-llm` providers.
//!
//! [`LlmCompletion`] adapts any [`LLMProvider`] to the crate's
//! [`CompletionService`] seam. The provider is resolved from
//! [`CleanupConfig`] from most-specific to least-specific:
//!
//! 1. **Pre-built service** (`config.completion`) — used as-is; this is how
//!    tests inject a double.
//! 2. **Groq** (the default): an OpenAI-compatible client pointed at
//!    [`GROQ_BASE_URL`], built from `config.api_key` and `config.model`.
//! 3. **Any other provider name**: [`ProviderFactory::create_llm_provider`]
//!    builds it and reads the provider's key from its usual variable.

use super::{Completion, CompletionService, Message};
use crate::config::CleanupConfig;
use crate::error::{JournalError, Result};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// [`CompletionService`] backed by an `edgequake-llm` provider.
pub struct LlmCompletion {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
}

impl LlmCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }
}

#[async_trait]
impl CompletionService for LlmCompletion {
    async fn complete(&self, messages: &[Message], max_tokens: usize) -> Result<Completion> {
        let messages: Vec<ChatMessage> = messages.iter().map(to_chat_message).collect();
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| JournalError::LlmApiError {
                message: format!("{e}"),
            })?;

        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

fn to_chat_message(m: &Message) -> ChatMessage {
    ChatMessage::user(m.content.as_str())
}

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Resolve the completion service for a cleanup run.
///
/// `groq` is built from `config.api_key` and `config.model` directly. Any
/// other provider name goes through [`ProviderFactory`], which reads its
/// own key variable.
///
/// # Errors
/// - [`JournalError::MissingCredential`] when the Groq key or the model is unset
/// - [`JournalError::ProviderNotConfigured`] when the factory rejects the provider
pub fn resolve_completion(config: &CleanupConfig) -> Result<Arc<dyn CompletionService>> {
    if let Some(ref service) = config.completion {
        return Ok(Arc::clone(service));
    }

    let model = match config.model.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => {
            return Err(JournalError::MissingCredential {
                name: "completion model".into(),
                hint: "Set GROQ_MODEL to the model id to use for cleanup.".into(),
            })
        }
    };

    let provider: Arc<dyn LLMProvider> = if config.provider_name.eq_ignore_ascii_case("groq") {
        let api_key = match config.api_key.as_deref() {
            Some(k) if !k.is_empty() => k,
            _ => {
                return Err(JournalError::MissingCredential {
                    name: "Groq API key".into(),
                    hint: "Set GROQ_API_KEY or pass --api-key.".into(),
                })
            }
        };
        debug!("Using Groq model {} at {}", model, GROQ_BASE_URL);
        Arc::new(OpenAIProvider::compatible(api_key, GROQ_BASE_URL).with_model(model))
    } else {
        ProviderFactory::create_llm_provider(&config.provider_name, model).map_err(|e| {
            JournalError::ProviderNotConfigured {
                provider: config.provider_name.clone(),
                hint: format!("{e}"),
            }
        })?
    };

    Ok(Arc::new(LlmCompletion::new(provider, config.temperature)))
}
