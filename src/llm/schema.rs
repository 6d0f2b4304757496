//! Structured-output contract for transcript summaries
//!
//! The summarizer asks the model for JSON matching [`response_schema`]; the
//! raw chat-completion body is only trusted after
//! [`parse_structured_summary`] has pulled it apart.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{NotescribeError, Result};

const SERVICE: &str = "summary";

pub const SCHEMA_NAME: &str = "response_schema";

/// Paragraphed transcript plus summary, as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredSummary {
    /// Transcript text with paragraphs separated by `\n\n`
    pub logical_paragraphs: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_items: Option<Vec<String>>,
}

/// JSON schema declared in the `response_format` of the request.
pub fn response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "logical_paragraphs": {
                "description": "The logical paragraphs of the transcribed audio, separated by a blank line",
                "type": "string"
            },
            "summary": {
                "description": "The summary of the transcribed audio",
                "type": "string"
            },
            "action_items": {
                "description": "Action items mentioned in the transcribed audio",
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["logical_paragraphs", "summary"],
        "additionalProperties": false
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Parse a raw chat-completion body into a [`StructuredSummary`].
///
/// The message content is itself a JSON document; both layers must parse.
pub fn parse_structured_summary(raw: &str) -> Result<StructuredSummary> {
    let envelope: ChatCompletionResponse = serde_json::from_str(raw)
        .map_err(|e| NotescribeError::malformed(SERVICE, format!("invalid response body: {}", e)))?;

    let content = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| NotescribeError::malformed(SERVICE, "response contained no choices"))?
        .message
        .content
        .ok_or_else(|| NotescribeError::malformed(SERVICE, "first choice has no content"))?;

    serde_json::from_str(&content)
        .map_err(|e| NotescribeError::malformed(SERVICE, format!("invalid summary content: {}", e)))
}
