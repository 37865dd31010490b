//! Exact and near-duplicate page detection.
//!
//! Two passes:
//!
//! 1. **Exact**: pages with the same [`ContentHash`](crate::hashing::ContentHash) form a group.
//! 2. **Near**: remaining pages that have an embedding are compared pairwise; pairs at or above
//!    the similarity threshold are edges of a graph whose connected components (found with a
//!    [`DisjointSet`]) become groups. A ≈ B and B ≈ C put A, B and C in one group even when
//!    A and C fall below the threshold.
//!
//! Every group keeps its lowest page index as the canonical representative. Pages without an
//! embedding only take part in the exact pass.

mod union_find;


pub use union_find::DisjointSet;

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::continuity::cosine_similarity;
use crate::hashing::ContentHash;
use crate::model::Page;

/// How a duplicate was recognised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuplicateBasis {
    /// Same normalized text as the canonical page.
    ExactHash,
    /// Strongest above-threshold edge from this page within its group.
    NearDuplicate { similarity: f64, linked_to: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Exact,
    Near,
}

/// A set of pages considered the same page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Lowest index in the group.
    pub canonical: usize,
    /// All members, ascending, canonical included.
    pub members: Vec<usize>,
    pub kind: GroupKind,
}

/// One excluded page and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateEntry {
    pub page_index: usize,
    pub canonical: usize,
    pub basis: DuplicateBasis,
}

/// Groups and per-page duplicate references for a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    /// Non-canonical members of every group, ascending by page index.
    pub duplicates: Vec<DuplicateEntry>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn canonical_of(&self, page_index: usize) -> Option<usize> {
        self.entry(page_index).map(|e| e.canonical)
    }

    pub fn entry(&self, page_index: usize) -> Option<&DuplicateEntry> {
        self.duplicates.iter().find(|e| e.page_index == page_index)
    }

    pub fn duplicate_indices(&self) -> Vec<usize> {
        self.duplicates.iter().map(|e| e.page_index).collect()
    }

    pub fn exact_count(&self) -> usize {
        self.duplicates
            .iter()
            .filter(|e| e.basis == DuplicateBasis::ExactHash)
            .count()
    }

    pub fn near_count(&self) -> usize {
        self.duplicates.len() - self.exact_count()
    }

    /// Writes `duplicate_of` onto the pages this report marks as duplicates.
    pub fn apply(&self, pages: &mut [Page]) {
        for page in pages.iter_mut() {
            page.duplicate_of = self.canonical_of(page.index);
        }
    }
}

/// Partitions pages into canonical pages and duplicates.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateResolver {
    near_threshold: f64,
}

impl DuplicateResolver {
    pub fn new(near_threshold: f64) -> Self {
        Self { near_threshold }
    }

    pub fn resolve(&self, pages: &[Page]) -> DuplicateReport {
        let mut report = DuplicateReport::default();

        let mut by_hash: BTreeMap<ContentHash, Vec<usize>> = BTreeMap::new();
        for page in pages {
            by_hash.entry(page.content_hash).or_default().push(page.index);
        }

        let mut exact_grouped = vec![false; pages.len()];
        for mut members in by_hash.into_values().filter(|m| m.len() > 1) {
            members.sort_unstable();
            let canonical = members[0];
            for &member in &members {
                if let Some(flag) = exact_grouped.get_mut(member) {
                    *flag = true;
                }
            }
            for &member in &members[1..] {
                report.duplicates.push(DuplicateEntry {
                    page_index: member,
                    canonical,
                    basis: DuplicateBasis::ExactHash,
                });
            }
            report.groups.push(DuplicateGroup {
                canonical,
                members,
                kind: GroupKind::Exact,
            });
        }

        let candidates: Vec<&Page> = pages
            .iter()
            .filter(|p| {
                p.embedding.is_some() && !exact_grouped.get(p.index).copied().unwrap_or(false)
            })
            .collect();

        let edges = self.similarity_edges(&candidates);
        debug!(
            candidates = candidates.len(),
            edges = edges.len(),
            threshold = self.near_threshold,
            "near-duplicate edges computed"
        );

        // Barrier: union-find runs single-threaded over the finished edge list.
        let mut set = DisjointSet::new(candidates.len());
        for &(a, b, _) in &edges {
            set.union(a, b);
        }

        for group in set.groups() {
            let mut members: Vec<usize> = group.iter().map(|&pos| candidates[pos].index).collect();
            members.sort_unstable();
            let canonical = members[0];

            for &pos in &group {
                let page_index = candidates[pos].index;
                if page_index == canonical {
                    continue;
                }
                let (similarity, linked_to) = strongest_edge(&edges, pos)
                    .map(|(other, sim)| (sim, candidates[other].index))
                    .unwrap_or((self.near_threshold, canonical));

                report.duplicates.push(DuplicateEntry {
                    page_index,
                    canonical,
                    basis: DuplicateBasis::NearDuplicate {
                        similarity,
                        linked_to,
                    },
                });
            }

            report.groups.push(DuplicateGroup {
                canonical,
                members,
                kind: GroupKind::Near,
            });
        }

        report.groups.sort_by_key(|g| g.canonical);
        report.duplicates.sort_by_key(|e| e.page_index);

        if !report.is_empty() {
            info!(
                groups = report.groups.len(),
                exact = report.exact_count(),
                near = report.near_count(),
                "duplicate pages found"
            );
        }

        report
    }

    /// Above-threshold pairs `(i, j, similarity)` with `i < j`, as candidate positions.
    fn similarity_edges(&self, candidates: &[&Page]) -> Vec<(usize, usize, f64)> {
        let threshold = self.near_threshold;

        let mut edges: Vec<(usize, usize, f64)> = (0..candidates.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                ((i + 1)..candidates.len()).filter_map(move |j| {
                    let a = candidates[i].embedding.as_deref()?;
                    let b = candidates[j].embedding.as_deref()?;
                    let sim = cosine_similarity(a, b)?;
                    (sim >= threshold).then_some((i, j, sim))
                })
            })
            .collect();

        edges.sort_by_key(|&(i, j, _)| (i, j));
        edges
    }
}

/// The highest-similarity neighbour of `pos`; ties go to the lower position.
fn strongest_edge(edges: &[(usize, usize, f64)], pos: usize) -> Option<(usize, f64)> {
    edges
        .iter()
        .filter_map(|&(a, b, sim)| match pos {
            p if p == a => Some((b, sim)),
            p if p == b => Some((a, sim)),
            _ => None,
        })
        .fold(None, |best: Option<(usize, f64)>, (other, sim)| match best {
            Some((bo, bs)) if bs > sim || (bs == sim && bo < other) => Some((bo, bs)),
            _ => Some((other, sim)),
        })
}
