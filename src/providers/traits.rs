use async_trait::async_trait;
use anyhow::Result;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed non-empty, already trimmed text.
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector `encode` returns.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> String;
}

/// Completes a prompt with free text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the completions in the order the model produced them.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>>;

    fn model_name(&self) -> String;
}
