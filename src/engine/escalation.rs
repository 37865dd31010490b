//! Escalation policy and the bounded call to the reasoning collaborator.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::model::{EscalationOutcome, EscalationReason, Page};
use crate::reasoning::{PageSummary, ReasoningClient, ReasoningError};

/// Document-level signal statistics the policy looks at.
pub(super) struct SignalStats {
    pub coverage: f64,
    /// Fraction of pages with neither an accepted number nor a section label.
    pub unlabeled_fraction: f64,
    /// Swaps made by refinement; `None` on the numeric path.
    pub refinement_swaps: Option<usize>,
}

/// Reasons to escalate, empty when the rule-based order should stand.
///
/// Single-page and empty documents are never escalated.
pub(super) fn triggers(stats: &SignalStats, page_count: usize, config: &Config) -> Vec<EscalationReason> {
    let mut reasons = Vec::new();
    if page_count < 2 {
        return reasons;
    }

    if stats.coverage < config.escalation_coverage_floor {
        reasons.push(EscalationReason::LowCoverage {
            coverage: stats.coverage,
            floor: config.escalation_coverage_floor,
        });
    }

    if stats.unlabeled_fraction > config.escalation_unlabeled_fraction {
        reasons.push(EscalationReason::UnlabeledPages {
            fraction: stats.unlabeled_fraction,
            limit: config.escalation_unlabeled_fraction,
        });
    }

    if stats.refinement_swaps == Some(0) {
        reasons.push(EscalationReason::NoImprovingSwaps);
    }

    reasons
}

/// Checks that `proposed` orders exactly the pages in `expected`, each once.
pub fn validate_permutation(proposed: &[usize], expected: &[usize]) -> Result<(), String> {
    let expected_set: HashSet<usize> = expected.iter().copied().collect();
    let mut seen: HashSet<usize> = HashSet::with_capacity(proposed.len());

    for &index in proposed {
        if !expected_set.contains(&index) {
            return Err(format!("unknown page index {index}"));
        }
        if !seen.insert(index) {
            return Err(format!("page index {index} appears more than once"));
        }
    }

    let mut missing: Vec<usize> = expected_set.difference(&seen).copied().collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(format!(
            "expected {} pages, got {}; missing {missing:?}",
            expected.len(),
            proposed.len()
        ));
    }

    Ok(())
}

pub(super) struct EscalationAttempt {
    pub outcome: EscalationOutcome,
    pub collaborator_invoked: bool,
    /// The validated order, when accepted.
    pub order: Option<Vec<usize>>,
}

/// Sends page summaries to `client` under `timeout` and validates the reply.
pub(super) async fn escalate(
    client: Option<&Arc<dyn ReasoningClient>>,
    active: &[&Page],
    number_floor: f64,
    timeout: Duration,
) -> EscalationAttempt {
    let Some(client) = client else {
        return EscalationAttempt {
            outcome: EscalationOutcome::Unavailable {
                reason: "no reasoning collaborator configured".to_string(),
            },
            collaborator_invoked: false,
            order: None,
        };
    };

    let summaries: Vec<PageSummary> = active
        .iter()
        .map(|p| PageSummary::from_page(p, number_floor))
        .collect();
    let expected: Vec<usize> = active.iter().map(|p| p.index).collect();
    let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

    info!(client = client.name(), pages = summaries.len(), "escalating to reasoning collaborator");

    let outcome = match tokio::time::timeout(timeout, client.propose_order(&summaries)).await {
        Err(_) => EscalationOutcome::TimedOut { after_ms },
        Ok(Err(ReasoningError::Timeout { after_ms })) => EscalationOutcome::TimedOut { after_ms },
        Ok(Err(ReasoningError::Unavailable(reason))) => EscalationOutcome::Unavailable { reason },
        Ok(Err(ReasoningError::InvalidResponse(reason))) => {
            EscalationOutcome::InvalidResponse { reason }
        }
        Ok(Ok(proposal)) => match validate_permutation(&proposal.order, &expected) {
            Ok(()) => {
                info!(
                    client = client.name(),
                    document_type = proposal.document_type.as_deref().unwrap_or("unknown"),
                    "collaborator order accepted"
                );
                return EscalationAttempt {
                    outcome: EscalationOutcome::Accepted,
                    collaborator_invoked: true,
                    order: Some(proposal.order),
                };
            }
            Err(reason) => EscalationOutcome::InvalidResponse { reason },
        },
    };

    warn!(client = client.name(), outcome = ?outcome, "keeping rule-based order");
    EscalationAttempt {
        outcome,
        collaborator_invoked: true,
        order: None,
    }
}
