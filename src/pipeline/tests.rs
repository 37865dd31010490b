use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::config::{ConfigError, Weights};
use crate::engine::EngineError;
use crate::model::{OrderingMethod, Placement};
use crate::providers::{
    InMemoryTextProvider, PrecomputedEmbeddings, ProviderError, StubEmbedder,
};
use crate::reasoning::{MockBehavior, MockReasoningClient};
use crate::signals::PatternFamily;

/// Counts calls through to a [`StubEmbedder`].
#[derive(Default)]
struct CountingEmbedder {
    inner: StubEmbedder,
    calls: AtomicUsize,
}

impl EmbeddingProvider for CountingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

fn pipeline() -> Pipeline {
    Pipeline::new(Config::default(), None).unwrap()
}

fn numbered_text(body: &str, number: u32, total: u32) -> String {
    format!("{body}\nThe parties continue the discussion on this page.\nPage {number} of {total}")
}

#[test]
fn test_build_features_extracts_signals() {
    let provider = InMemoryTextProvider::from_texts([
        "INTRODUCTION\nThis agreement sets out the background of the deal.\nPage 1 of 2",
        "Closing remarks on the arrangement between the firms.\nPage 2 of 2",
    ]);

    let build = pipeline().build_features(&provider, None, 2).unwrap();
    let first = build.features.page(0).unwrap();

    let number = first.detected_number.unwrap();
    assert_eq!(number.value, 1);
    assert_eq!(number.pattern, PatternFamily::PageOfTotal);
    assert!((number.confidence - 1.0).abs() < 1e-12);
    assert_eq!(first.title.as_deref(), Some("INTRODUCTION"));
    assert_eq!(first.section.as_ref().unwrap().label, "introduction");
    assert!(!first.blank);
    assert!(first.embedding.is_none());
    assert!(build.gaps.is_empty());
    assert!(build.duplicates.is_empty());
}

#[tokio::test]
async fn test_process_restores_numbered_order() {
    let numbers = [3, 1, 5, 2, 4];
    let texts: Vec<String> = numbers
        .iter()
        .map(|&n| numbered_text(&format!("Clause {n} body text"), n, 5))
        .collect();
    let provider = InMemoryTextProvider::from_texts(texts);

    let processed = pipeline().process(&provider, None, 5).await.unwrap();

    assert_eq!(processed.decision.method, OrderingMethod::Numeric);
    assert_eq!(processed.decision.ordering, vec![1, 3, 0, 4, 2]);
    assert_eq!(processed.report.total_pages, 5);
    assert_eq!(processed.report.run_id, processed.decision.run_id);
}

#[tokio::test]
async fn test_extraction_failure_degrades_to_blank_page() {
    let provider = InMemoryTextProvider::new(vec![
        Some(numbered_text("Opening terms", 1, 3)),
        None,
        Some(numbered_text("Middle terms", 2, 3)),
    ]);

    let processed = pipeline().process(&provider, None, 3).await.unwrap();
    let decision = &processed.decision;

    assert_eq!(decision.ordering, vec![0, 2, 1]);
    let failed = decision.trace_for(1).unwrap();
    assert_eq!(failed.placement, Placement::BlankTail);
    assert!(processed.report.pages[1].blank);
}

#[test]
fn test_missing_pages_reported() {
    let provider = InMemoryTextProvider::from_texts([
        numbered_text("First", 1, 6),
        numbered_text("Second", 2, 6),
        numbered_text("Fifth", 5, 6),
    ]);

    let build = pipeline().build_features(&provider, None, 3).unwrap();
    assert_eq!(build.gaps, vec![3, 4]);
}

#[tokio::test]
async fn test_exact_duplicate_text_excluded() {
    let repeated = numbered_text("Repeated scan", 1, 2);
    let provider = InMemoryTextProvider::from_texts([
        repeated.clone(),
        numbered_text("Other page", 2, 2),
        repeated,
    ]);

    let processed = pipeline().process(&provider, None, 3).await.unwrap();

    assert_eq!(processed.decision.excluded_duplicates, vec![2]);
    assert_eq!(processed.decision.ordering, vec![0, 1]);
    assert_eq!(processed.duplicates.canonical_of(2), Some(0));
}

#[test]
fn test_near_duplicates_from_embeddings() {
    let texts = [
        "A long paragraph about the delivery schedule of goods.",
        "A long paragraph about the delivery schedule of goods!!",
        "Something else entirely, about payment of invoices.",
    ];
    let mut embeddings = PrecomputedEmbeddings::new();
    embeddings.insert(texts[0], vec![1.0, 0.0]);
    embeddings.insert(texts[1], vec![0.99, 0.01]);
    embeddings.insert(texts[2], vec![0.0, 1.0]);
    let provider = InMemoryTextProvider::from_texts(texts);

    let build = pipeline()
        .build_features(&provider, Some(&embeddings), 3)
        .unwrap();

    assert_eq!(build.duplicates.canonical_of(1), Some(0));
    assert_eq!(build.features.page(1).unwrap().duplicate_of, Some(0));
    assert_eq!(build.features.page(2).unwrap().duplicate_of, None);
}

#[test]
fn test_embedding_cache_memoises_by_content() {
    let embedder = CountingEmbedder::default();
    let provider = InMemoryTextProvider::from_texts([
        "The same paragraph of text appears here.",
        "The same paragraph of text appears here.",
        "A different paragraph of text appears here.",
    ]);
    let pipeline = pipeline();

    let build = pipeline.build_features(&provider, Some(&embedder), 3).unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    assert!(build.features.pages().iter().all(|p| p.embedding.is_some()));

    // A new document starts with an empty cache.
    pipeline.build_features(&provider, Some(&embedder), 3).unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_same_text_under_different_embedders_keeps_each_vector() {
    let texts = [
        "Shared opening paragraph about the lease terms.",
        "Shared closing paragraph about the lease renewal.",
    ];
    let mut forward = PrecomputedEmbeddings::new();
    forward.insert(texts[0], vec![1.0, 0.0]);
    forward.insert(texts[1], vec![0.0, 1.0]);
    let mut swapped = PrecomputedEmbeddings::new();
    swapped.insert(texts[0], vec![0.0, 1.0]);
    swapped.insert(texts[1], vec![1.0, 0.0]);
    let provider = InMemoryTextProvider::from_texts(texts);
    let pipeline = pipeline();

    let first = pipeline.build_features(&provider, Some(&forward), 2).unwrap();
    let second = pipeline.build_features(&provider, Some(&swapped), 2).unwrap();

    let vector = |build: &FeatureBuild, index: usize| {
        build.features.page(index).unwrap().embedding.clone().unwrap()
    };
    assert_eq!(vector(&first, 0), vec![1.0, 0.0]);
    assert_eq!(vector(&second, 0), vec![0.0, 1.0]);
    assert_eq!(vector(&second, 1), vec![1.0, 0.0]);
}

#[test]
fn test_blank_pages_skip_embedding_and_sections() {
    let embedder = CountingEmbedder::default();
    let provider = InMemoryTextProvider::from_texts(["- 7 -", "   ", "Contents of the annual filing for the year."]);

    let build = pipeline().build_features(&provider, Some(&embedder), 3).unwrap();
    let dashed = build.features.page(0).unwrap();

    assert!(dashed.blank);
    assert!(dashed.section.is_none());
    assert!(dashed.embedding.is_none());
    assert_eq!(dashed.detected_number.map(|n| n.value), Some(7));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_heading_numbers_order_unnumbered_pages() {
    let bodies = ["Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta"];
    let mut texts: Vec<String> = bodies
        .iter()
        .zip(1..)
        .map(|(body, n)| numbered_text(body, n, 10))
        .collect();
    texts.push("3.10 Training Regime\nWe train on eight accelerators for three days.".into());
    texts.push("3 Model Architecture\nThe encoder maps an input sequence to vectors.".into());
    texts.push("3.2 Attention\nAn attention function maps a query and key value pairs.".into());
    let provider = InMemoryTextProvider::from_texts(texts);

    let processed = pipeline().process(&provider, None, 10).await.unwrap();

    assert_eq!(processed.decision.method, OrderingMethod::Numeric);
    assert_eq!(&processed.decision.ordering[7..], &[8, 9, 7]);
    let row = &processed.report.pages[9];
    assert_eq!(row.title.as_deref(), Some("3.2 Attention"));
    assert_eq!(row.section_number.as_deref(), Some("3.2"));
    assert!(processed.report.pages[0].section_number.is_none());
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = Config::default().with_weights(Weights::new(0.5, 0.5, 0.5));

    let err = Pipeline::new(config, None).err().unwrap();
    assert!(matches!(
        err,
        PipelineError::Engine(EngineError::ConfigInvalid(
            ConfigError::WeightsDoNotSumToOne { .. }
        ))
    ));
}

#[tokio::test]
async fn test_unlabelled_document_escalates_to_reasoner() {
    let mock = Arc::new(MockReasoningClient::new(MockBehavior::Reverse));
    let reasoner: Arc<dyn ReasoningClient> = mock.clone();
    let pipeline = Pipeline::new(Config::default(), Some(reasoner)).unwrap();
    let provider = InMemoryTextProvider::from_texts([
        "Unmarked prose about the harvest season.",
        "Unmarked prose about the winter storage.",
        "Unmarked prose about the spring planting.",
    ]);

    let processed = pipeline.process(&provider, None, 3).await.unwrap();

    assert_eq!(mock.call_count(), 1);
    assert_eq!(processed.decision.method, OrderingMethod::AiAssisted);
    assert_eq!(processed.decision.ordering, vec![2, 1, 0]);
}

#[tokio::test]
async fn test_process_batch_keeps_input_order() {
    let pipeline = Arc::new(pipeline());
    let first: Arc<dyn TextProvider> = Arc::new(InMemoryTextProvider::from_texts([
        numbered_text("Alpha", 2, 3),
        numbered_text("Beta", 1, 3),
        numbered_text("Gamma", 3, 3),
    ]));
    let second: Arc<dyn TextProvider> = Arc::new(InMemoryTextProvider::from_texts([
        "Delta covers shipping routes and harbour fees.\nPage 2 of 2",
        "Epsilon lists the crew and their duties.\nPage 1 of 2",
    ]));
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(StubEmbedder::default());

    let results = pipeline
        .process_batch(vec![
            BatchDocument::new(first),
            BatchDocument::new(second).with_embedder(embedder),
        ])
        .await;

    assert_eq!(results.len(), 2);
    let first = results[0].as_ref().unwrap();
    let second = results[1].as_ref().unwrap();
    assert_eq!(first.decision.ordering, vec![1, 0, 2]);
    assert_eq!(second.decision.ordering, vec![1, 0]);
    assert_ne!(first.decision.run_id, second.decision.run_id);
}
