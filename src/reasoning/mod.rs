//! External AI reasoning collaborator.
//!
//! The engine escalates ambiguous documents through the [`ReasoningClient`] trait. Two
//! implementations ship with the crate:
//!
//! - [`GenaiReasoner`]: asks a chat model (via `genai`) for a JSON reading order.
//! - [`MockReasoningClient`]: scripted answers for tests (`mock` feature or `cfg(test)`).
//!
//! Whatever a client returns is untrusted; the engine checks it is a permutation of the pages
//! it sent before using it.

pub mod client;
pub mod error;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

pub use client::ReasoningClient;
pub use error::ReasoningError;
pub use llm::GenaiReasoner;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockReasoningClient};
pub use types::{PageSummary, ProposedOrder};
