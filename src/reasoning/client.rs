use async_trait::async_trait;

use super::error::ReasoningError;
use super::types::{PageSummary, ProposedOrder};

#[async_trait]
/// External collaborator that proposes a full page order for an ambiguous document.
///
/// Implementations need not enforce their own deadline; the engine bounds every call with
/// the configured AI timeout.
pub trait ReasoningClient: Send + Sync {
    /// Returns a candidate ordering of the summarized pages.
    async fn propose_order(&self, pages: &[PageSummary]) -> Result<ProposedOrder, ReasoningError>;

    /// Short identifier for logs and reports.
    fn name(&self) -> &str;
}
