use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::client::ReasoningClient;
use super::error::ReasoningError;
use super::types::{PageSummary, ProposedOrder};

/// What the mock answers.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Returns this exact order.
    Fixed(Vec<usize>),
    /// Returns the summarized indices in reverse.
    Reverse,
    /// Returns the summarized indices sorted by detected number, unnumbered last.
    ByDetectedNumber,
    /// Fails with this error.
    Fail(ReasoningError),
    /// Sleeps, then answers like [`MockBehavior::Reverse`].
    Delay(Duration),
}

/// In-process [`ReasoningClient`] that records every call.
pub struct MockReasoningClient {
    behavior: MockBehavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<Vec<PageSummary>>>,
}

impl MockReasoningClient {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn fixed(order: Vec<usize>) -> Self {
        Self::new(MockBehavior::Fixed(order))
    }

    pub fn failing(error: ReasoningError) -> Self {
        Self::new(MockBehavior::Fail(error))
    }

    /// Number of `propose_order` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Summaries passed on the most recent call.
    pub fn last_request(&self) -> Option<Vec<PageSummary>> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }

    fn reversed(pages: &[PageSummary]) -> ProposedOrder {
        ProposedOrder::new(pages.iter().rev().map(|p| p.index).collect())
    }
}

#[async_trait]
impl ReasoningClient for MockReasoningClient {
    async fn propose_order(&self, pages: &[PageSummary]) -> Result<ProposedOrder, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(pages.to_vec());
        }

        match &self.behavior {
            MockBehavior::Fixed(order) => Ok(ProposedOrder::new(order.clone())),
            MockBehavior::Reverse => Ok(Self::reversed(pages)),
            MockBehavior::ByDetectedNumber => {
                let mut sorted: Vec<&PageSummary> = pages.iter().collect();
                sorted.sort_by_key(|p| (p.detected_number.unwrap_or(u32::MAX), p.index));
                Ok(ProposedOrder::new(sorted.iter().map(|p| p.index).collect()))
            }
            MockBehavior::Fail(error) => Err(error.clone()),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::reversed(pages))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
