use std::collections::HashMap;

use tracing::debug;

use super::error::ProviderError;
use crate::hashing::{ContentHash, hash_page_text, hash_parts, hash_to_u64, normalize_text};

/// Default dimension of [`StubEmbedder`] vectors.
pub const STUB_EMBEDDING_DIM: usize = 256;

/// Turns page text into a fixed-dimension vector.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    fn dimension(&self) -> usize;
}

/// Deterministic hashed bag-of-words embedder.
///
/// Unigrams and bigrams are hashed into signed buckets and the vector is L2-normalized, so
/// pages sharing vocabulary land close together. No model is loaded; useful for tests and for
/// running the pipeline without an inference backend.
#[derive(Debug, Clone, Copy)]
pub struct StubEmbedder {
    dim: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(STUB_EMBEDDING_DIM)
    }
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn add(&self, embedding: &mut [f32], hash: u64, weight: f32) {
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

impl EmbeddingProvider for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let normalized = normalize_text(text);
        let tokens: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return Err(ProviderError::EmbeddingUnavailable(
                "page has no tokens".to_string(),
            ));
        }

        debug!(tokens = tokens.len(), "generating stub embedding");

        let mut embedding = vec![0.0f32; self.dim];
        for token in &tokens {
            self.add(&mut embedding, hash_to_u64(token.as_bytes()), 1.0);
        }
        for pair in tokens.windows(2) {
            self.add(&mut embedding, hash_parts(&[pair[0], pair[1]]), 0.5);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Vectors computed elsewhere, looked up by the page's content hash.
///
/// Pages without a stored vector fall back to `fallback` when set, otherwise they report
/// [`ProviderError::EmbeddingUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEmbeddings {
    vectors: HashMap<ContentHash, Vec<f32>>,
    dim: usize,
    fallback: Option<StubEmbedder>,
}

impl PrecomputedEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, fallback: StubEmbedder) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn insert(&mut self, text: &str, vector: Vec<f32>) {
        self.dim = self.dim.max(vector.len());
        self.vectors.insert(hash_page_text(text), vector);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingProvider for PrecomputedEmbeddings {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if let Some(vector) = self.vectors.get(&hash_page_text(text)) {
            return Ok(vector.clone());
        }
        match &self.fallback {
            Some(stub) => stub.embed(text),
            None => Err(ProviderError::EmbeddingUnavailable(
                "no precomputed vector for page".to_string(),
            )),
        }
    }

    fn dimension(&self) -> usize {
        match &self.fallback {
            Some(stub) if self.dim == 0 => stub.dimension(),
            _ => self.dim,
        }
    }
}
