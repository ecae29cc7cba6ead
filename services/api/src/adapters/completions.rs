//! services/api/src/adapters/completions.rs
//!
//! This module contains the adapter for the text/vision completion service.
//! It implements the `CompletionService` port from the `core` crate using an
//! OpenAI-compatible chat-completions API.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use mediscribe_core::ports::{CompletionRequest, CompletionService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
///
/// The client is only constructed when an API key was configured; without
/// one, every call fails with a configuration error before any network I/O.
pub struct OpenAiCompletions {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiCompletions {
    /// Creates a new `OpenAiCompletions` for the given model.
    pub fn new(api_key: Option<&str>, model: String) -> Self {
        let client =
            api_key.map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));
        Self { client, model }
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiCompletions {
    async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
        let client = self.client.as_ref().ok_or_else(|| {
            PortError::Configuration("OPENAI_API_KEY is not configured".to_string())
        })?;

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(system) = &request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
        }

        // With an attached exam image the user turn becomes multimodal:
        // the text part plus a high-detail image reference.
        let user_message = match &request.image_url {
            Some(url) => {
                let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                    ChatCompletionRequestMessageContentPartTextArgs::default()
                        .text(request.user.as_str())
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(
                            ImageUrlArgs::default()
                                .url(url.as_str())
                                .detail(ImageDetail::High)
                                .build()
                                .map_err(|e| PortError::Unexpected(e.to_string()))?,
                        )
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                ];
                ChatCompletionRequestUserMessageArgs::default()
                    .content(parts)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
            }
            None => ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        };
        messages.push(user_message.into());

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Provider(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content)
    }
}
