//! Notion module for notescribe
//!
//! Formats structured summaries as Notion blocks and publishes them as pages.

mod blocks;
mod client;

pub use blocks::{
    format_summary, split_paragraphs, DocumentBlock, PARAGRAPH_DELIMITER, SUMMARY_HEADING,
    TRANSCRIPTION_HEADING,
};
pub use client::{AccessToken, DatabaseSummary, Icon, NotionClient, Publisher, TitleText};
