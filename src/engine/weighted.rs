//! Low-coverage path: fused score ranking plus adjacent-swap continuity refinement.

use tracing::debug;

use crate::config::Weights;
use crate::constants::REFINEMENT_EPSILON;
use crate::continuity::ContinuityMatrix;
use crate::model::{Page, Placement};

pub(super) struct WeightedOrder {
    pub ordering: Vec<(usize, Placement)>,
    pub swaps: usize,
    /// Passes actually run.
    pub passes: u32,
    /// `true` when the pass cap stopped refinement while an improving swap remained.
    pub cap_reached: bool,
}

/// `wNumber * number confidence + wSection * section signal`; continuity is pairwise and
/// applied afterwards.
pub(super) fn page_score(page: &Page, weights: &Weights) -> f64 {
    let number = page.detected_number.map_or(0.0, |n| n.confidence);
    let section = page.section.as_ref().map_or(0.0, |s| s.signal);
    weights.number * number + weights.section * section
}

pub(super) fn order(
    active: &[&Page],
    matrix: &ContinuityMatrix,
    weights: &Weights,
    floor: f64,
    max_passes: u32,
) -> WeightedOrder {
    let (blanks, content): (Vec<&Page>, Vec<&Page>) = active
        .iter()
        .copied()
        .partition(|p| p.blank && p.accepted_number(floor).is_none());

    let mut scored: Vec<(usize, f64)> = content
        .iter()
        .map(|p| (p.index, page_score(p, weights)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut sequence: Vec<usize> = scored.iter().map(|(index, _)| *index).collect();
    let refinement = refine(&mut sequence, matrix, max_passes);

    let score_of = |index: usize| {
        scored
            .iter()
            .find(|(i, _)| *i == index)
            .map_or(0.0, |(_, s)| *s)
    };

    let mut blank_indices: Vec<usize> = blanks.iter().map(|p| p.index).collect();
    blank_indices.sort_unstable();

    let ordering = sequence
        .into_iter()
        .map(|index| (index, Placement::ScoreRank { score: score_of(index) }))
        .chain(blank_indices.into_iter().map(|index| (index, Placement::BlankTail)))
        .collect();

    WeightedOrder {
        ordering,
        swaps: refinement.swaps,
        passes: refinement.passes,
        cap_reached: refinement.cap_reached,
    }
}

pub(super) struct Refinement {
    pub swaps: usize,
    pub passes: u32,
    pub cap_reached: bool,
}

/// Repeated passes of adjacent swaps, each accepted only if it strictly raises the continuity
/// of the swapped pair with its new neighbours. Unknown continuity counts as zero.
///
/// Every accepted swap raises the total adjacent continuity of the sequence, so the loop
/// terminates on its own; `max_passes` bounds the work on large documents. When the cap is
/// hit after a pass that swapped, one read-only scan decides whether the sequence had in
/// fact converged.
pub(super) fn refine(sequence: &mut [usize], matrix: &ContinuityMatrix, max_passes: u32) -> Refinement {
    let mut swaps = 0;
    let mut passes = 0;
    let mut improving = sequence.len() > 1;

    while improving && passes < max_passes {
        passes += 1;
        improving = false;

        for i in 0..sequence.len().saturating_sub(1) {
            if swap_gain(sequence, i, matrix) > REFINEMENT_EPSILON {
                sequence.swap(i, i + 1);
                swaps += 1;
                improving = true;
            }
        }

        debug!(pass = passes, swaps, "refinement pass complete");
    }

    let cap_reached = improving && has_improving_swap(sequence, matrix);

    Refinement {
        swaps,
        passes,
        cap_reached,
    }
}

fn has_improving_swap(sequence: &[usize], matrix: &ContinuityMatrix) -> bool {
    (0..sequence.len().saturating_sub(1))
        .any(|i| swap_gain(sequence, i, matrix) > REFINEMENT_EPSILON)
}

/// Change in neighbour continuity from swapping positions `i` and `i + 1`.
fn swap_gain(sequence: &[usize], i: usize, matrix: &ContinuityMatrix) -> f64 {
    let x = sequence[i];
    let y = sequence[i + 1];
    let before = i.checked_sub(1).map(|p| sequence[p]);
    let after = sequence.get(i + 2).copied();

    let c = |a: Option<usize>, b: usize| a.map_or(0.0, |a| matrix.get_or_zero(a, b));

    let current = c(before, x) + c(after, y);
    let swapped = c(before, y) + c(after, x);
    swapped - current
}
