use async_trait::async_trait;
use anyhow::{Result, anyhow};
use crate::config::RagConfig;
use crate::providers::traits::{Embedder, Generator};
use async_openai::{
    types::{
        CreateEmbeddingRequestArgs,
        EmbeddingInput,
        CreateChatCompletionRequestArgs,
        ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent,
        Role,
    },
    Client,
    config::OpenAIConfig,
};

const SYSTEM_MESSAGE: &str =
    "You answer employee questions using only the context provided with each question.";

/// Embeddings and chat completions from an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    chat_model: String,
    embedding_model: String,
    embedding_dimension: usize,
    temperature: f32,
}

impl OpenAIProvider {
    pub fn new(api_key: String, config: &RagConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(config.api_base.clone());

        Self {
            client: Client::with_config(openai_config),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimension: config.embedding_dimension,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Embedder for OpenAIProvider {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(EmbeddingInput::String(text.to_string()))
            .dimensions(u32::try_from(self.embedding_dimension)?)
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        response.data.into_iter().next()
            .map(|embedding| embedding.embedding)
            .ok_or_else(|| anyhow!("No embedding returned from {}", self.embedding_model))
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    fn model_name(&self) -> String {
        self.embedding_model.clone()
    }
}

#[async_trait]
impl Generator for OpenAIProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(vec![
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage {
                        role: Role::System,
                        content: SYSTEM_MESSAGE.to_string(),
                        name: None,
                    }
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage {
                        role: Role::User,
                        content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                        name: None,
                    }
                ),
            ])
            .max_tokens(u16::try_from(max_tokens).unwrap_or(u16::MAX))
            .temperature(self.temperature)
            .n(1)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let completions: Vec<String> = response.choices.into_iter()
            .filter_map(|choice| choice.message.content)
            .collect();

        if completions.is_empty() {
            return Err(anyhow!("No response content from {}", self.chat_model));
        }
        Ok(completions)
    }

    fn model_name(&self) -> String {
        self.chat_model.clone()
    }
}
