//! Answer generation: prompt template, model clients and the synthesizer

pub mod ollama;
pub mod prompt;
pub mod retry;
pub mod synthesizer;

pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
pub use synthesizer::AnswerSynthesizer;
