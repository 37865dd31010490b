//! Core data model: pages, the per-document feature set, and the ordering decision.

pub mod decision;
mod error;
pub mod page;

pub use decision::{
    DecisionNote, EscalationOutcome, EscalationReason, EscalationRecord, OrderingDecision,
    OrderingMethod, Placement, SignalContribution, SignalKind, TraceEntry,
};
pub use error::FeatureSetError;
pub use page::{DocumentFeatureSet, Page, PageNumber, SectionNumber, SectionTag};
