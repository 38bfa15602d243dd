//! Grounded answer synthesis

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::types::{Answer, ScoredChunk};

use super::prompt::PromptBuilder;

/// Builds the instruction prompt and calls the generation model under a deadline
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmProvider>,
    prompt: PromptBuilder,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>, prompt: PromptBuilder, timeout: Duration) -> Self {
        Self {
            llm,
            prompt,
            timeout,
        }
    }

    /// Create from config
    pub fn from_config(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self::new(
            llm,
            PromptBuilder::new(config.assistant_persona.clone()),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Answer `question` from `context`; the model output is returned unmodified
    pub async fn synthesize(&self, question: &str, context: Vec<ScoredChunk>) -> Result<Answer> {
        let start = Instant::now();
        let prompt = self.prompt.build(question, &context);

        tracing::debug!(
            provider = self.llm.name(),
            model = self.llm.model(),
            context_chunks = context.len(),
            prompt_chars = prompt.len(),
            "Synthesizing answer"
        );

        let text = tokio::time::timeout(self.timeout, self.llm.generate(&prompt))
            .await
            .map_err(|_| Error::timeout("answer generation", self.timeout.as_secs()))?
            .map_err(|e| match e {
                Error::Synthesis(_) | Error::Timeout { .. } => e,
                other => Error::synthesis(other.to_string()),
            })?;

        Ok(Answer {
            text,
            sources: context,
            is_fallback: false,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
