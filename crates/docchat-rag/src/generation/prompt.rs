//! Instruction template for grounded answers

use crate::types::{ScoredChunk, FALLBACK_ANSWER};

/// Builds the fixed instruction template around retrieved context
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
}

impl PromptBuilder {
    /// Create a builder whose template opens with `persona`
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    /// Concatenate chunk texts in retrieval order
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|scored| scored.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full prompt for `question` grounded on `chunks`
    pub fn build(&self, question: &str, chunks: &[ScoredChunk]) -> String {
        format!(
            r#"{persona} Follow these guidelines:

1. Use ONLY information from the provided context
2. Be concise and direct in your responses
3. If information is found in context:
   - Answer with specific details from the document
   - Include relevant prices, times, or quantities if present
   - Format lists or menu items in a clear, readable way
4. If information is partially available:
   - State what is known from the context
   - Clearly indicate what parts are not mentioned
5. If information is not in context:
   - Respond: "{fallback}"

Context:
{context}

Question:
{question}

Answer:
"#,
            persona = self.persona.trim_end(),
            fallback = FALLBACK_ANSWER,
            context = Self::build_context(chunks),
            question = question.trim(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkSource};
    use uuid::Uuid;

    fn scored(content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: Uuid::new_v4(),
                document_id: Uuid::nil(),
                content: content.to_string(),
                overlap: 0,
                chunk_index: 0,
                source: ChunkSource {
                    filename: "menu.pdf".to_string(),
                    page_number: 1,
                    char_start: 0,
                    char_end: content.chars().count(),
                },
                embedding: None,
            },
            score,
        }
    }

    #[test]
    fn test_context_keeps_retrieval_order() {
        let chunks = vec![scored("second best", 0.4), scored("best", 0.9)];
        assert_eq!(PromptBuilder::build_context(&chunks), "second best\n\nbest");
    }

    #[test]
    fn test_prompt_layout() {
        let builder = PromptBuilder::new("You are a precise and knowledgeable assistant for Byte & Spice Bistro.");
        let prompt = builder.build(" What time do you open? ", &[scored("Open daily 11am-10pm", 0.8)]);

        assert!(prompt.starts_with("You are a precise and knowledgeable assistant for Byte & Spice Bistro."));
        assert!(prompt.contains(FALLBACK_ANSWER));
        let context_at = prompt.find("Context:\nOpen daily 11am-10pm").unwrap();
        let question_at = prompt.find("Question:\nWhat time do you open?").unwrap();
        assert!(context_at < question_at);
        assert!(prompt.trim_end().ends_with("Answer:"));
    }
}
