//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::Result;

/// Trait for text generation
///
/// Implementations:
/// - `GeminiLlm`: Google Gemini API (gemini-2.5-flash)
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a fully built prompt and return the raw model output
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
