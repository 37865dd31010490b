use serde::Serialize;
use uuid::Uuid;

/// How the final ordering was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingMethod {
    /// Sorted by accepted page numbers (high coverage).
    Numeric,
    /// Fused signal score plus continuity refinement (low coverage).
    Weighted,
    /// Validated permutation returned by the reasoning collaborator.
    AiAssisted,
}

impl OrderingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderingMethod::Numeric => "numeric",
            OrderingMethod::Weighted => "weighted",
            OrderingMethod::AiAssisted => "ai-assisted",
        }
    }
}

impl std::fmt::Display for OrderingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Number,
    Section,
    Continuity,
    Ai,
}

/// One signal's share in a page's placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalContribution {
    pub signal: SignalKind,
    /// Normalized signal value before weighting.
    pub raw: f64,
    pub weight: f64,
    /// `raw * weight`.
    pub weighted: f64,
}

impl SignalContribution {
    pub fn new(signal: SignalKind, raw: f64, weight: f64) -> Self {
        Self {
            signal,
            raw,
            weight,
            weighted: raw * weight,
        }
    }
}

/// Where a page was placed and by which rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Part of the ascending run of accepted page numbers.
    NumberedRun { number: u32 },
    /// Appended after the numbered run by section rank, heading number and continuity.
    UnnumberedTail,
    /// Ranked by fused score (weighted path).
    ScoreRank { score: f64 },
    /// Placed after all content pages because it carries no content.
    BlankTail,
    /// Position taken from the reasoning collaborator's permutation.
    AiOrder,
}

/// Per-page explanation of the final placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub page_index: usize,
    /// Zero-based position in the final ordering.
    pub position: usize,
    pub method: OrderingMethod,
    pub placement: Placement,
    /// Signals that contributed (absent signals are omitted).
    pub contributions: Vec<SignalContribution>,
    pub confidence: f64,
}

impl TraceEntry {
    pub fn contributed(&self, signal: SignalKind) -> bool {
        self.contributions.iter().any(|c| c.signal == signal)
    }
}

/// Why a document was handed to the reasoning collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationReason {
    LowCoverage { coverage: f64, floor: f64 },
    UnlabeledPages { fraction: f64, limit: f64 },
    NoImprovingSwaps,
}

/// Result of an escalation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationOutcome {
    /// The collaborator's permutation was validated and used.
    Accepted,
    /// No collaborator configured or it reported itself unavailable.
    Unavailable { reason: String },
    TimedOut { after_ms: u64 },
    /// The response was malformed or not a permutation of the input pages.
    InvalidResponse { reason: String },
}

impl EscalationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EscalationOutcome::Accepted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationRecord {
    pub reasons: Vec<EscalationReason>,
    /// `false` only when no collaborator was configured.
    pub collaborator_invoked: bool,
    pub outcome: EscalationOutcome,
}

/// Run-level observations that did not affect validity of the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionNote {
    /// A duplicate reference could not be honoured; the page was kept in the ordering.
    DuplicateGraphInconsistent {
        page_index: usize,
        duplicate_of: usize,
        reason: String,
    },
    /// Continuity refinement stopped at the pass cap while still improving.
    RefinementCapReached { passes: u32 },
}

/// Output of one ordering run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderingDecision {
    pub run_id: Uuid,
    /// Page indices in final order; a permutation of all non-duplicate pages.
    pub ordering: Vec<usize>,
    /// Confidence per page, aligned with `ordering`.
    pub confidences: Vec<f64>,
    pub method: OrderingMethod,
    /// One entry per ordered page, aligned with `ordering`.
    pub trace: Vec<TraceEntry>,
    /// Pages left out because they duplicate a canonical page.
    pub excluded_duplicates: Vec<usize>,
    /// Fraction of non-duplicate pages with an accepted number.
    pub coverage: f64,
    /// Improving swaps made by continuity refinement (weighted path only).
    pub refinement_swaps: Option<usize>,
    pub escalation: Option<EscalationRecord>,
    pub notes: Vec<DecisionNote>,
}

impl OrderingDecision {
    /// Returns the trace entry of `page_index`, if it was ordered.
    pub fn trace_for(&self, page_index: usize) -> Option<&TraceEntry> {
        self.trace.iter().find(|t| t.page_index == page_index)
    }

    pub fn confidence_of(&self, page_index: usize) -> Option<f64> {
        self.trace_for(page_index).map(|t| t.confidence)
    }

    /// `true` when the reasoning collaborator was invoked (whatever the outcome).
    pub fn ai_attempted(&self) -> bool {
        self.escalation
            .as_ref()
            .is_some_and(|e| e.collaborator_invoked)
    }
}
