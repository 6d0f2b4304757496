//! LLM module for notescribe
//!
//! Handles paragraphing and summarizing transcripts with OpenAI chat
//! completions constrained to a JSON schema.

mod client;
pub(crate) mod openai;
mod prompts;
mod schema;

pub use client::{build_summarizer, Summarizer};
pub use openai::OpenAiSummarizer;
pub use prompts::SUMMARY_SYSTEM_PROMPT;
pub use schema::{parse_structured_summary, response_schema, StructuredSummary, SCHEMA_NAME};
