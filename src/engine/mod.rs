//! Hybrid page ordering.
//!
//! [`HybridOrderingEngine::order`] turns a [`DocumentFeatureSet`] into an [`OrderingDecision`]
//! in one sequential pass:
//!
//! 1. Drop duplicates (after checking their references are consistent).
//! 2. Compute number coverage over the remaining pages.
//! 3. Pick a path:
//!    - **numeric** (`coverage >= number_coverage_threshold`): sort by accepted number, then
//!      append unnumbered pages by section rank and continuity.
//!    - **weighted**: rank by `wNumber * confidence + wSection * section signal`, then refine
//!      with adjacent swaps that improve continuity.
//! 4. Escalate to the [`ReasoningClient`] when signals are weak; accept its answer only if it
//!    is a permutation of the ordered pages.
//! 5. Score per-page confidence from the original signals and write the trace.
//!
//! Ordering never fails. Only configuration is validated, once, at construction.

mod error;
mod escalation;
mod numeric;
mod weighted;


pub use error::{EngineError, EngineResult};
pub use escalation::validate_permutation;

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::continuity::ContinuityMatrix;
use crate::model::{
    DecisionNote, DocumentFeatureSet, EscalationRecord, OrderingDecision, OrderingMethod, Page,
    Placement, SignalContribution, SignalKind, TraceEntry,
};
use crate::reasoning::ReasoningClient;

use escalation::SignalStats;

/// Fuses page signals into a single ordering.
///
/// Holds a validated, immutable [`Config`]; independent documents may be ordered concurrently
/// through a shared reference.
pub struct HybridOrderingEngine {
    config: Config,
    reasoner: Option<Arc<dyn ReasoningClient>>,
}

impl HybridOrderingEngine {
    /// Validates `config` and builds the engine. `reasoner` may be `None`; escalations are then
    /// recorded as unavailable.
    pub fn new(config: Config, reasoner: Option<Arc<dyn ReasoningClient>>) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config, reasoner })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_reasoner(&self) -> bool {
        self.reasoner.is_some()
    }

    pub async fn order(&self, features: &DocumentFeatureSet) -> OrderingDecision {
        let run_id = Uuid::new_v4();
        let floor = self.config.number_acceptance_floor;
        let weights = self.config.weights;

        let (active, excluded_duplicates, mut notes) = partition_duplicates(features);

        if active.is_empty() {
            info!(%run_id, pages = features.len(), "nothing to order");
            return OrderingDecision {
                run_id,
                ordering: Vec::new(),
                confidences: Vec::new(),
                method: OrderingMethod::Weighted,
                trace: Vec::new(),
                excluded_duplicates,
                coverage: 0.0,
                refinement_swaps: None,
                escalation: None,
                notes,
            };
        }

        let matrix = ContinuityMatrix::build(features.pages());

        let numbered = active
            .iter()
            .filter(|p| p.accepted_number(floor).is_some())
            .count();
        let coverage = numbered as f64 / active.len() as f64;

        let (mut method, mut placements, refinement_swaps) =
            if coverage >= self.config.number_coverage_threshold {
                debug!(%run_id, coverage, "numeric path");
                (
                    OrderingMethod::Numeric,
                    numeric::order(&active, &matrix, floor),
                    None,
                )
            } else {
                let outcome = weighted::order(
                    &active,
                    &matrix,
                    &weights,
                    floor,
                    self.config.refinement_max_passes,
                );
                debug!(
                    %run_id,
                    coverage,
                    swaps = outcome.swaps,
                    passes = outcome.passes,
                    "weighted path"
                );
                if outcome.cap_reached {
                    warn!(%run_id, passes = outcome.passes, "refinement stopped at pass cap");
                    notes.push(DecisionNote::RefinementCapReached {
                        passes: outcome.passes,
                    });
                }
                (OrderingMethod::Weighted, outcome.ordering, Some(outcome.swaps))
            };

        let unlabeled = active
            .iter()
            .filter(|p| p.accepted_number(floor).is_none() && p.section.is_none())
            .count();
        let stats = SignalStats {
            coverage,
            unlabeled_fraction: unlabeled as f64 / active.len() as f64,
            refinement_swaps,
        };

        let reasons = escalation::triggers(&stats, active.len(), &self.config);
        let escalation = if reasons.is_empty() {
            None
        } else {
            info!(%run_id, reasons = ?reasons, "document flagged for escalation");
            let attempt = escalation::escalate(
                self.reasoner.as_ref(),
                &active,
                floor,
                self.config.ai_timeout,
            )
            .await;

            if let Some(order) = attempt.order {
                method = OrderingMethod::AiAssisted;
                placements = order
                    .into_iter()
                    .map(|index| (index, Placement::AiOrder))
                    .collect();
            }

            Some(EscalationRecord {
                reasons,
                collaborator_invoked: attempt.collaborator_invoked,
                outcome: attempt.outcome,
            })
        };

        let ordering: Vec<usize> = placements.iter().map(|(index, _)| *index).collect();
        let trace: Vec<TraceEntry> = placements
            .into_iter()
            .enumerate()
            .map(|(position, (page_index, placement))| {
                self.trace_entry(features, &matrix, &ordering, position, page_index, method, placement)
            })
            .collect();
        let confidences = trace.iter().map(|t| t.confidence).collect();

        info!(
            %run_id,
            method = %method,
            pages = ordering.len(),
            excluded = excluded_duplicates.len(),
            coverage,
            "ordering complete"
        );

        OrderingDecision {
            run_id,
            ordering,
            confidences,
            method,
            trace,
            excluded_duplicates,
            coverage,
            refinement_swaps,
            escalation,
            notes,
        }
    }

    /// Confidence is rebuilt from the page's own signals whatever the method, so a
    /// collaborator's order never raises it.
    #[allow(clippy::too_many_arguments)]
    fn trace_entry(
        &self,
        features: &DocumentFeatureSet,
        matrix: &ContinuityMatrix,
        ordering: &[usize],
        position: usize,
        page_index: usize,
        method: OrderingMethod,
        placement: Placement,
    ) -> TraceEntry {
        let weights = &self.config.weights;
        let mut contributions = Vec::new();

        if let Some(page) = features.page(page_index) {
            if let Some(number) = page.detected_number {
                contributions.push(SignalContribution::new(
                    SignalKind::Number,
                    number.confidence,
                    weights.number,
                ));
            }
            if page.section.is_some() {
                contributions.push(SignalContribution::new(
                    SignalKind::Section,
                    1.0,
                    weights.section,
                ));
            }
        }

        let neighbours = [
            position.checked_sub(1).map(|p| ordering[p]),
            ordering.get(position + 1).copied(),
        ];
        let known: Vec<f64> = neighbours
            .into_iter()
            .flatten()
            .filter_map(|n| matrix.get(page_index, n))
            .collect();
        if !known.is_empty() {
            let mean = known.iter().sum::<f64>() / known.len() as f64;
            contributions.push(SignalContribution::new(
                SignalKind::Continuity,
                mean.max(0.0),
                weights.continuity,
            ));
        }

        if method == OrderingMethod::AiAssisted {
            contributions.push(SignalContribution::new(SignalKind::Ai, 1.0, 0.0));
        }

        let confidence = contributions
            .iter()
            .map(|c| c.weighted)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        TraceEntry {
            page_index,
            position,
            method,
            placement,
            contributions,
            confidence,
        }
    }
}

/// Splits pages into those to order and honoured duplicates.
///
/// A `duplicate_of` reference is honoured only when it points at another existing page that
/// is not itself a duplicate; otherwise the page stays in the ordering and a note is recorded.
fn partition_duplicates(features: &DocumentFeatureSet) -> (Vec<&Page>, Vec<usize>, Vec<DecisionNote>) {
    let mut active = Vec::with_capacity(features.len());
    let mut excluded = Vec::new();
    let mut notes = Vec::new();

    for page in features.pages() {
        let Some(canonical) = page.duplicate_of else {
            active.push(page);
            continue;
        };

        let problem = match features.page(canonical) {
            _ if canonical == page.index => Some("page references itself"),
            None => Some("canonical page does not exist"),
            Some(target) if target.duplicate_of.is_some() => {
                Some("canonical page is itself marked as a duplicate")
            }
            Some(_) => None,
        };

        match problem {
            None => excluded.push(page.index),
            Some(reason) => {
                warn!(page = page.index, duplicate_of = canonical, reason, "inconsistent duplicate reference");
                notes.push(DecisionNote::DuplicateGraphInconsistent {
                    page_index: page.index,
                    duplicate_of: canonical,
                    reason: reason.to_string(),
                });
                active.push(page);
            }
        }
    }

    (active, excluded, notes)
}
