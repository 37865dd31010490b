//! Feature extraction plus one full ordering run.
//!
//! [`Pipeline::build_features`] turns raw page text (and optional embeddings) into a
//! [`DocumentFeatureSet`]:
//!
//! 1. Per page, in parallel: extract text, hash it, detect the title (and any heading number)
//!    and blank pages, classify the section, find a page-number candidate and embed the text (memoised by content hash
//!    within the document).
//! 2. Sequentially, in original order: score number candidates for plausibility and collect
//!    missing page numbers.
//! 3. After that barrier: resolve exact and near duplicates and mark them on the pages.
//!
//! [`Pipeline::process`] then hands the feature set to the [`HybridOrderingEngine`] and builds
//! the [`DocumentReport`].

mod error;

#[cfg(test)]
mod tests;

pub use error::{PipelineError, PipelineResult};

use std::sync::Arc;

use futures_util::future::join_all;
use moka::sync::Cache;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dedup::{DuplicateReport, DuplicateResolver};
use crate::engine::HybridOrderingEngine;
use crate::hashing::ContentHash;
use crate::model::{DocumentFeatureSet, OrderingDecision, Page};
use crate::providers::{EmbeddingProvider, TextProvider};
use crate::reasoning::ReasoningClient;
use crate::report::DocumentReport;
use crate::signals::{
    NumberCandidate, PageNumberExtractor, SectionClassifier, detect_candidate, detect_title,
    extract_section_number, find_gaps, is_blank_page,
};

/// Output of [`Pipeline::build_features`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBuild {
    pub features: DocumentFeatureSet,
    pub duplicates: DuplicateReport,
    /// Page numbers missing between the accepted ones, ascending.
    pub gaps: Vec<u32>,
}

/// Everything produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    pub decision: OrderingDecision,
    pub duplicates: DuplicateReport,
    pub gaps: Vec<u32>,
    pub report: DocumentReport,
}

/// One document of a [`Pipeline::process_batch`] call.
#[derive(Clone)]
pub struct BatchDocument {
    pub text: Arc<dyn TextProvider>,
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl BatchDocument {
    pub fn new(text: Arc<dyn TextProvider>) -> Self {
        Self {
            text,
            embedder: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

/// Embeddings of one document keyed by page content hash.
type EmbeddingCache = Cache<ContentHash, Arc<Vec<f32>>>;

/// Per-page output of the parallel extraction stage.
struct ExtractedPage {
    page: Page,
    candidate: Option<NumberCandidate>,
}

/// Signal extractors, duplicate resolver and engine sharing one validated [`Config`].
///
/// Each [`build_features`](Self::build_features) call memoises embeddings in its own cache,
/// so documents embedded by different providers never see each other's vectors.
pub struct Pipeline {
    engine: HybridOrderingEngine,
    numbers: PageNumberExtractor,
    sections: SectionClassifier,
    dedup: DuplicateResolver,
    embedding_cache_capacity: u64,
}

impl Pipeline {
    pub fn new(config: Config, reasoner: Option<Arc<dyn ReasoningClient>>) -> PipelineResult<Self> {
        let numbers = PageNumberExtractor::new(config.number_acceptance_floor);
        let sections = SectionClassifier::new(config.section_match_floor);
        let dedup = DuplicateResolver::new(config.near_duplicate_threshold);
        let embedding_cache_capacity = config.embedding_cache_capacity;
        let engine = HybridOrderingEngine::new(config, reasoner)?;

        Ok(Self {
            engine,
            numbers,
            sections,
            dedup,
            embedding_cache_capacity,
        })
    }

    pub fn config(&self) -> &Config {
        self.engine.config()
    }

    pub fn engine(&self) -> &HybridOrderingEngine {
        &self.engine
    }

    pub fn build_features(
        &self,
        text_provider: &dyn TextProvider,
        embedder: Option<&dyn EmbeddingProvider>,
        page_count: usize,
    ) -> PipelineResult<FeatureBuild> {
        let embeddings: EmbeddingCache = Cache::builder()
            .max_capacity(self.embedding_cache_capacity)
            .build();
        let extracted: Vec<ExtractedPage> = (0..page_count)
            .into_par_iter()
            .map(|index| self.extract_page(text_provider, embedder, &embeddings, index))
            .collect();

        // Barrier: plausibility looks across pages in original order.
        let candidates: Vec<Option<NumberCandidate>> =
            extracted.iter().map(|e| e.candidate).collect();
        let numbers = self.numbers.score_candidates(&candidates);

        let mut pages: Vec<Page> = extracted
            .into_iter()
            .zip(numbers)
            .map(|(extracted, number)| {
                let mut page = extracted.page;
                page.detected_number = number;
                page
            })
            .collect();

        let floor = self.numbers.acceptance_floor();
        let accepted: Vec<u32> = pages
            .iter()
            .filter_map(|p| p.accepted_number(floor))
            .collect();
        let gaps = find_gaps(&accepted);
        if !gaps.is_empty() {
            info!(missing = ?gaps, "page numbers missing from sequence");
        }

        let duplicates = self.dedup.resolve(&pages);
        duplicates.apply(&mut pages);

        let features = DocumentFeatureSet::from_pages(pages)?;
        debug!(
            pages = features.len(),
            numbered = accepted.len(),
            duplicates = duplicates.duplicates.len(),
            "feature set built"
        );

        Ok(FeatureBuild {
            features,
            duplicates,
            gaps,
        })
    }

    fn extract_page(
        &self,
        text_provider: &dyn TextProvider,
        embedder: Option<&dyn EmbeddingProvider>,
        embeddings: &EmbeddingCache,
        index: usize,
    ) -> ExtractedPage {
        let text = match text_provider.extract(index) {
            Ok(extracted) => extracted.text,
            Err(e) => {
                warn!(page = index, error = %e, "text extraction failed; page has no text");
                String::new()
            }
        };

        let mut page = Page::new(index, text);
        page.blank = is_blank_page(&page.text);

        if page.blank {
            // Blank pages may still carry a bare page number.
            let candidate = detect_candidate(&page.text);
            return ExtractedPage { page, candidate };
        }

        page.title = detect_title(&page.text);
        page.section = self.sections.classify(&page.text, page.title.as_deref());
        page.section_number = page.title.as_deref().and_then(extract_section_number);
        page.embedding = embedder.and_then(|e| embed(embeddings, e, &page));
        let candidate = detect_candidate(&page.text);

        ExtractedPage { page, candidate }
    }

    /// Builds features, orders the pages and assembles the report.
    pub async fn process(
        &self,
        text_provider: &dyn TextProvider,
        embedder: Option<&dyn EmbeddingProvider>,
        page_count: usize,
    ) -> PipelineResult<ProcessedDocument> {
        let FeatureBuild {
            features,
            duplicates,
            gaps,
        } = self.build_features(text_provider, embedder, page_count)?;

        let decision = self.engine.order(&features).await;
        let report = DocumentReport::build(
            &features,
            &decision,
            &duplicates,
            &gaps,
            self.config().weights,
        );

        Ok(ProcessedDocument {
            decision,
            duplicates,
            gaps,
            report,
        })
    }

    /// Processes independent documents concurrently, one task each. Results keep input order.
    pub async fn process_batch(
        self: &Arc<Self>,
        documents: Vec<BatchDocument>,
    ) -> Vec<PipelineResult<ProcessedDocument>> {
        info!(documents = documents.len(), "processing batch");

        let handles: Vec<_> = documents
            .into_iter()
            .map(|doc| {
                let pipeline = Arc::clone(self);
                tokio::spawn(async move {
                    let page_count = doc.text.page_count();
                    pipeline
                        .process(doc.text.as_ref(), doc.embedder.as_deref(), page_count)
                        .await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(PipelineError::TaskFailed(e.to_string())),
            })
            .collect()
    }
}

fn embed(
    embeddings: &EmbeddingCache,
    embedder: &dyn EmbeddingProvider,
    page: &Page,
) -> Option<Vec<f32>> {
    let result = embeddings
        .try_get_with(page.content_hash, || embedder.embed(&page.text).map(Arc::new));

    match result {
        Ok(vector) => Some(vector.as_ref().clone()),
        Err(e) => {
            debug!(page = page.index, error = %e, "no embedding for page");
            None
        }
    }
}
