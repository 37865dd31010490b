//! Pairwise continuity between pages.
//!
//! Continuity is the cosine similarity of two page embeddings, in `[-1, 1]`. It is *absent*
//! (not zero) when either page has no embedding, the dimensions differ, or a vector has zero
//! norm; callers decide what absence means for them.

use rayon::prelude::*;

use crate::model::Page;

/// Cosine similarity of two vectors, accumulated in `f64` and clamped to `[-1, 1]`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f64, 0.0f64, 0.0f64), |(dot, na, nb), (&av, &bv)| {
                let (av, bv) = (f64::from(av), f64::from(bv));
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 || !dot.is_finite() {
        None
    } else {
        Some((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
    }
}

/// Scores how likely two pages were adjacent in the source document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuityScorer;

impl ContinuityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, a: &Page, b: &Page) -> Option<f64> {
        cosine_similarity(a.embedding.as_deref()?, b.embedding.as_deref()?)
    }
}

/// Precomputed continuity for every ordered pair of pages, indexed by page index.
#[derive(Debug, Clone)]
pub struct ContinuityMatrix {
    n: usize,
    cells: Vec<Option<f64>>,
}

impl ContinuityMatrix {
    /// Scores all pairs in parallel. `pages[i].index` must equal `i`.
    pub fn build(pages: &[Page]) -> Self {
        let n = pages.len();
        let scorer = ContinuityScorer::new();

        let cells = (0..n * n)
            .into_par_iter()
            .map(|k| {
                let (i, j) = (k / n, k % n);
                if i == j {
                    None
                } else {
                    scorer.score(&pages[i], &pages[j])
                }
            })
            .collect();

        Self { n, cells }
    }

    /// Continuity between pages `a` and `b`; `None` when unknown or out of range.
    #[inline]
    pub fn get(&self, a: usize, b: usize) -> Option<f64> {
        if a >= self.n || b >= self.n {
            return None;
        }
        self.cells[a * self.n + b]
    }

    /// Continuity with absence counted as zero, as the refinement pass treats it.
    #[inline]
    pub fn get_or_zero(&self, a: usize, b: usize) -> f64 {
        self.get(a, b).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// `true` if at least one pair has a known score.
    pub fn has_any(&self) -> bool {
        self.cells.iter().any(Option::is_some)
    }
}
