//! Folio library crate (used by the `folio` binary and integration tests).
//!
//! Restores the reading order of a shuffled document from weak per-page signals: detected
//! page numbers, section keywords and embedding continuity, with an optional AI reasoning
//! collaborator for documents whose signals are too weak.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Config`], [`Weights`], [`ConfigError`] - Tunables and their validation
//! - [`Page`], [`DocumentFeatureSet`] - Per-document input
//! - [`OrderingDecision`], [`TraceEntry`] - Ordering output and per-page explanation
//!
//! ## Ordering
//! - [`HybridOrderingEngine`] - Numeric / weighted ordering with escalation
//! - [`Pipeline`] - Feature extraction plus one full ordering run
//! - [`DocumentReport`] - Serialisable report and text explanation
//!
//! ## Signals
//! - [`PageNumberExtractor`], [`SectionClassifier`] - Per-page signal extraction
//! - [`ContinuityMatrix`], [`DuplicateResolver`] - Pairwise similarity and duplicates
//!
//! ## Collaborators
//! - [`TextProvider`], [`EmbeddingProvider`] - Page text and embeddings
//! - [`ReasoningClient`], [`GenaiReasoner`] - AI ordering collaborator
//!
//! ## Test/Mock Support
//! [`MockReasoningClient`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod continuity;
pub mod dedup;
pub mod engine;
pub mod hashing;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod reasoning;
pub mod report;
pub mod signals;

pub use config::{Config, ConfigError, Weights};
pub use continuity::{ContinuityMatrix, ContinuityScorer, cosine_similarity};
pub use dedup::{DuplicateBasis, DuplicateGroup, DuplicateReport, DuplicateResolver, GroupKind};
pub use engine::{EngineError, EngineResult, HybridOrderingEngine, validate_permutation};
pub use hashing::{ContentHash, hash_page_text};
pub use model::{
    DecisionNote, DocumentFeatureSet, EscalationOutcome, EscalationReason, EscalationRecord,
    FeatureSetError, OrderingDecision, OrderingMethod, Page, PageNumber, Placement,
    SectionNumber, SectionTag, SignalContribution, SignalKind, TraceEntry,
};
pub use pipeline::{
    BatchDocument, FeatureBuild, Pipeline, PipelineError, PipelineResult, ProcessedDocument,
};
pub use providers::{
    EmbeddingProvider, ExtractedText, InMemoryTextProvider, PrecomputedEmbeddings,
    ProviderError, StubEmbedder, TextProvider,
};
pub use reasoning::{GenaiReasoner, PageSummary, ProposedOrder, ReasoningClient, ReasoningError};
#[cfg(any(test, feature = "mock"))]
pub use reasoning::{MockBehavior, MockReasoningClient};
pub use report::{DocumentReport, PageMove, PageRow};
pub use signals::{
    PageNumberExtractor, PatternFamily, SectionClassifier, extract_section_number, find_gaps,
};
