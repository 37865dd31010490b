//! High-coverage path: order by accepted page number.

use std::collections::BTreeMap;

use crate::continuity::ContinuityMatrix;
use crate::model::{Page, Placement};

/// Pages with accepted numbers ascending (ties by index), then unnumbered content pages grouped
/// by section rank, then unnumbered blank pages by index.
///
/// Within a rank group, pages whose title carries a heading number come first in heading order
/// (ties by index); the rest are chained by continuity from the last placed page.
pub(super) fn order(
    active: &[&Page],
    matrix: &ContinuityMatrix,
    floor: f64,
) -> Vec<(usize, Placement)> {
    let mut numbered: Vec<(u32, usize)> = Vec::new();
    // `None` rank sorts last through the `(bool, u32)` key.
    let mut by_section: BTreeMap<(bool, u32), Vec<&Page>> = BTreeMap::new();
    let mut blanks: Vec<usize> = Vec::new();

    for page in active.iter().copied() {
        match page.accepted_number(floor) {
            Some(number) => numbered.push((number, page.index)),
            None if page.blank => blanks.push(page.index),
            None => {
                let key = page
                    .section
                    .as_ref()
                    .map_or((true, u32::MAX), |s| (false, s.rank));
                by_section.entry(key).or_default().push(page);
            }
        }
    }

    numbered.sort_unstable();
    blanks.sort_unstable();

    let mut placed: Vec<(usize, Placement)> = numbered
        .into_iter()
        .map(|(number, index)| (index, Placement::NumberedRun { number }))
        .collect();

    for (_, group) in by_section {
        let mut headed: Vec<(&[u32], usize)> = Vec::new();
        let mut rest: Vec<usize> = Vec::new();
        for page in group {
            match &page.section_number {
                Some(number) => headed.push((number.key.as_slice(), page.index)),
                None => rest.push(page.index),
            }
        }

        headed.sort_unstable();
        placed.extend(
            headed
                .into_iter()
                .map(|(_, index)| (index, Placement::UnnumberedTail)),
        );

        rest.sort_unstable();
        let mut last = placed.last().map(|(index, _)| *index);
        while !rest.is_empty() {
            let pick = nearest_neighbour(&rest, last, matrix);
            let index = rest.remove(pick);
            placed.push((index, Placement::UnnumberedTail));
            last = Some(index);
        }
    }

    placed.extend(blanks.into_iter().map(|index| (index, Placement::BlankTail)));
    placed
}

/// Position in `candidates` (sorted ascending) with the highest known continuity to `last`.
///
/// Falls back to the lowest index when nothing is known; ties keep the lower index.
fn nearest_neighbour(candidates: &[usize], last: Option<usize>, matrix: &ContinuityMatrix) -> usize {
    let Some(last) = last else {
        return 0;
    };

    let mut best: Option<(usize, f64)> = None;
    for (pos, &candidate) in candidates.iter().enumerate() {
        if let Some(score) = matrix.get(last, candidate)
            && best.is_none_or(|(_, s)| score > s)
        {
            best = Some((pos, score));
        }
    }

    best.map_or(0, |(pos, _)| pos)
}
