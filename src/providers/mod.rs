//! Seams for the two external inputs of a run: page text and page embeddings.
//!
//! Both are synchronous and `Send + Sync` so feature extraction can fan out across pages.
//! A failing provider degrades one page (no text, no embedding), never the run.

mod embedding;
mod error;
mod text;

pub use embedding::{EmbeddingProvider, PrecomputedEmbeddings, STUB_EMBEDDING_DIM, StubEmbedder};
pub use error::ProviderError;
pub use text::{ExtractedText, InMemoryTextProvider, TextProvider};
