//! Human- and machine-readable output of one ordering run.
//!
//! [`DocumentReport`] joins the feature set, the [`OrderingDecision`] and the duplicate report
//! into one serialisable value with a row per original page. [`DocumentReport::explain`]
//! renders the short text summary.


use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Weights;
use crate::constants::{MAJOR_MOVE_DISTANCE, MAJOR_MOVES_SHOWN};
use crate::dedup::{DuplicateGroup, DuplicateReport, GroupKind};
use crate::model::{
    DecisionNote, DocumentFeatureSet, EscalationOutcome, EscalationReason, EscalationRecord,
    OrderingDecision, OrderingMethod, SignalKind,
};
use crate::signals::PatternFamily;

/// One original page and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub original_index: usize,
    /// Zero-based position in the final ordering; `None` for excluded duplicates.
    pub position: Option<usize>,
    pub detected_number: Option<u32>,
    pub number_confidence: Option<f64>,
    pub number_pattern: Option<PatternFamily>,
    pub title: Option<String>,
    pub section: Option<String>,
    /// Heading number read from the title.
    pub section_number: Option<String>,
    pub blank: bool,
    pub duplicate_of: Option<usize>,
    pub confidence: Option<f64>,
    /// Signals that contributed to the placement.
    pub signals: Vec<SignalKind>,
}

/// A page whose final position is far from its original one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMove {
    pub page_index: usize,
    pub from: usize,
    pub to: usize,
}

impl PageMove {
    pub fn distance(&self) -> usize {
        self.from.abs_diff(self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub method: OrderingMethod,
    pub total_pages: usize,
    pub ordering: Vec<usize>,
    pub excluded_duplicates: Vec<usize>,
    pub coverage: f64,
    pub weights: Weights,
    pub refinement_swaps: Option<usize>,
    pub escalation: Option<EscalationRecord>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub missing_pages: Vec<u32>,
    /// Pages moved by more than [`MAJOR_MOVE_DISTANCE`] positions, in final order.
    pub major_moves: Vec<PageMove>,
    pub notes: Vec<DecisionNote>,
    pub pages: Vec<PageRow>,
}

impl DocumentReport {
    pub fn build(
        features: &DocumentFeatureSet,
        decision: &OrderingDecision,
        duplicates: &DuplicateReport,
        missing_pages: &[u32],
        weights: Weights,
    ) -> Self {
        let pages = features
            .pages()
            .iter()
            .map(|page| {
                let trace = decision.trace_for(page.index);
                PageRow {
                    original_index: page.index,
                    position: trace.map(|t| t.position),
                    detected_number: page.detected_number.map(|n| n.value),
                    number_confidence: page.detected_number.map(|n| n.confidence),
                    number_pattern: page.detected_number.map(|n| n.pattern),
                    title: page.title.clone(),
                    section: page.section.as_ref().map(|s| s.label.clone()),
                    section_number: page.section_number.as_ref().map(|n| n.label.clone()),
                    blank: page.blank,
                    duplicate_of: page.duplicate_of,
                    confidence: trace.map(|t| t.confidence),
                    signals: trace
                        .map(|t| t.contributions.iter().map(|c| c.signal).collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Self {
            run_id: decision.run_id,
            generated_at: Utc::now(),
            method: decision.method,
            total_pages: features.len(),
            ordering: decision.ordering.clone(),
            excluded_duplicates: decision.excluded_duplicates.clone(),
            coverage: decision.coverage,
            weights,
            refinement_swaps: decision.refinement_swaps,
            escalation: decision.escalation.clone(),
            duplicate_groups: duplicates.groups.clone(),
            missing_pages: missing_pages.to_vec(),
            major_moves: major_moves(&decision.ordering),
            notes: decision.notes.clone(),
            pages,
        }
    }

    /// Text summary. Positions are shown 1-based.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_explanation(&mut out);
        out
    }

    fn write_explanation(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Page ordering report (run {})", self.run_id)?;
        writeln!(out, "Method: {}", self.method)?;
        writeln!(
            out,
            "Pages: {} total, {} ordered, {} duplicates excluded",
            self.total_pages,
            self.ordering.len(),
            self.excluded_duplicates.len()
        )?;
        writeln!(out, "Number coverage: {:.1}%", self.coverage * 100.0)?;
        writeln!(
            out,
            "Weights: number {:.2}, section {:.2}, continuity {:.2}",
            self.weights.number, self.weights.section, self.weights.continuity
        )?;
        if let Some(swaps) = self.refinement_swaps {
            writeln!(out, "Continuity refinement: {swaps} improving swaps")?;
        }

        if self.major_moves.is_empty() {
            writeln!(out, "Major reorderings: none")?;
        } else {
            writeln!(out, "Major reorderings:")?;
            for m in self.major_moves.iter().take(MAJOR_MOVES_SHOWN) {
                writeln!(
                    out,
                    "  page {} moved from position {} to {}",
                    m.page_index,
                    m.from + 1,
                    m.to + 1
                )?;
            }
            if self.major_moves.len() > MAJOR_MOVES_SHOWN {
                writeln!(
                    out,
                    "  ... and {} more",
                    self.major_moves.len() - MAJOR_MOVES_SHOWN
                )?;
            }
        }

        match &self.escalation {
            None => writeln!(out, "Escalation: not needed")?,
            Some(record) => {
                let reasons: Vec<String> = record.reasons.iter().map(describe_reason).collect();
                writeln!(
                    out,
                    "Escalation: {} ({})",
                    describe_outcome(&record.outcome),
                    reasons.join("; ")
                )?;
            }
        }

        let near = self
            .duplicate_groups
            .iter()
            .filter(|g| g.kind == GroupKind::Near)
            .count();
        writeln!(
            out,
            "Duplicates: {} pages in {} groups ({} exact, {} near)",
            self.excluded_duplicates.len(),
            self.duplicate_groups.len(),
            self.duplicate_groups.len() - near,
            near
        )?;

        if self.missing_pages.is_empty() {
            writeln!(out, "Missing pages: none")?;
        } else {
            let missing: Vec<String> = self.missing_pages.iter().map(u32::to_string).collect();
            writeln!(out, "Missing pages: {}", missing.join(", "))?;
        }

        for note in &self.notes {
            match note {
                DecisionNote::DuplicateGraphInconsistent {
                    page_index,
                    duplicate_of,
                    reason,
                } => writeln!(
                    out,
                    "Note: page {page_index} kept despite duplicate_of {duplicate_of} ({reason})"
                )?,
                DecisionNote::RefinementCapReached { passes } => {
                    writeln!(out, "Note: refinement stopped after {passes} passes")?
                }
            }
        }

        Ok(())
    }
}

fn major_moves(ordering: &[usize]) -> Vec<PageMove> {
    ordering
        .iter()
        .enumerate()
        .map(|(to, &page_index)| PageMove {
            page_index,
            from: page_index,
            to,
        })
        .filter(|m| m.distance() > MAJOR_MOVE_DISTANCE)
        .collect()
}

fn describe_reason(reason: &EscalationReason) -> String {
    match reason {
        EscalationReason::LowCoverage { coverage, floor } => {
            format!("number coverage {coverage:.2} below {floor:.2}")
        }
        EscalationReason::UnlabeledPages { fraction, limit } => {
            format!("{:.0}% of pages unlabeled, limit {:.0}%", fraction * 100.0, limit * 100.0)
        }
        EscalationReason::NoImprovingSwaps => "continuity found no improving swap".to_string(),
    }
}

fn describe_outcome(outcome: &EscalationOutcome) -> String {
    match outcome {
        EscalationOutcome::Accepted => "collaborator order accepted".to_string(),
        EscalationOutcome::Unavailable { reason } => format!("collaborator unavailable: {reason}"),
        EscalationOutcome::TimedOut { after_ms } => {
            format!("collaborator timed out after {after_ms} ms")
        }
        EscalationOutcome::InvalidResponse { reason } => {
            format!("collaborator response rejected: {reason}")
        }
    }
}
