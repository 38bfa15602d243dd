//! Offline embedder based on token feature hashing
//!
//! Each content word is hashed into one of `dimensions` buckets with a
//! hash-derived sign; the resulting term-frequency vector is L2-normalised.
//! No model download or network access is needed, and the output is
//! deterministic across runs and platforms.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

const STOPWORDS: &[&str] = &[
    "what", "is", "the", "a", "an", "and", "or", "for", "in", "on", "to", "of", "are", "how",
    "does", "do", "can", "will", "be", "this", "that", "with", "from", "by", "at", "as", "it",
    "its", "which", "you", "your", "we", "our", "there", "any", "have", "has",
];

/// Deterministic hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::Config("hashing embedder needs at least one dimension".to_string()));
        }
        Ok(Self { dimensions })
    }

    /// Embed synchronously
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 1 && !STOPWORDS.contains(&w.as_str()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
