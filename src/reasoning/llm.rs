use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use serde::Deserialize;
use tracing::{debug, warn};

use super::client::ReasoningClient;
use super::error::ReasoningError;
use super::types::{PageSummary, ProposedOrder};

const SYSTEM_PROMPT: &str = "You restore the reading order of shuffled document pages. \
Answer with a single JSON object and nothing else.";

/// [`ReasoningClient`] backed by any chat model `genai` can reach.
///
/// Provider credentials come from the environment, as `genai::Client::default()` reads them.
pub struct GenaiReasoner {
    client: Client,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OrderReply {
    correct_order: Vec<usize>,
    #[serde(default)]
    document_type: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

impl GenaiReasoner {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(pages: &[PageSummary]) -> Result<ChatRequest, ReasoningError> {
        let summaries = serde_json::to_string_pretty(pages)
            .map_err(|e| ReasoningError::InvalidResponse(format!("summary encoding: {e}")))?;

        let prompt = format!(
            "A shuffled document has {count} pages. Each entry below summarizes one page \
             (header, footer, opening excerpt, and any detected page number, section or heading number).\n\n\
             {summaries}\n\n\
             Work out the document type and its logical reading order from titles, headers, \
             numbering and content flow. Return ONLY this JSON object:\n\
             {{\n  \"document_type\": \"legal document|academic paper|book|report|manual|other\",\n  \
             \"confidence\": 0.0,\n  \"reasoning\": \"short explanation\",\n  \
             \"correct_order\": [every page index exactly once, in reading order]\n}}",
            count = pages.len(),
        );

        Ok(ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ]))
    }
}

/// Removes a surrounding Markdown code fence (with or without a language tag).
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[start + 3..];
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parses a model reply into a [`ProposedOrder`]. Validation against the page set is left to
/// the engine.
pub(crate) fn parse_reply(text: &str) -> Result<ProposedOrder, ReasoningError> {
    let body = strip_code_fence(text);
    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(ReasoningError::InvalidResponse(
                "reply contains no JSON object".to_string(),
            ));
        }
    };

    let reply: OrderReply = serde_json::from_str(json)
        .map_err(|e| ReasoningError::InvalidResponse(format!("malformed reply: {e}")))?;

    Ok(ProposedOrder {
        order: reply.correct_order,
        document_type: reply.document_type,
        confidence: reply.confidence,
        rationale: reply.reasoning,
    })
}

#[async_trait]
impl ReasoningClient for GenaiReasoner {
    async fn propose_order(&self, pages: &[PageSummary]) -> Result<ProposedOrder, ReasoningError> {
        let request = Self::build_request(pages)?;
        debug!(model = %self.model, pages = pages.len(), "sending page summaries");

        let response = self
            .client
            .exec_chat(&self.model, request, None)
            .await
            .map_err(|e| {
                warn!(model = %self.model, error = %e, "reasoning call failed");
                ReasoningError::Unavailable(e.to_string())
            })?;

        let text = response.first_text().unwrap_or_default();
        parse_reply(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
