//! Document blocks and the summary-to-page formatter

use serde::Serialize;

use crate::llm::StructuredSummary;

/// Delimiter between logical paragraphs in model output.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

pub const TRANSCRIPTION_HEADING: &str = "Transcription";
pub const SUMMARY_HEADING: &str = "Summary";

/// A single block appended to a page, rendered in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBlock {
    Heading(String),
    Paragraph(String),
}

impl DocumentBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::Heading(text.into())
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Heading(text) | Self::Paragraph(text) => text,
        }
    }
}

/// Split paragraphed text on blank lines.
///
/// Empty segments are kept, so `""` yields a single empty paragraph.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split(PARAGRAPH_DELIMITER).collect()
}

/// Lay out a summary as: transcription heading, one paragraph per segment,
/// summary heading, summary paragraph.
pub fn format_summary(summary: &StructuredSummary) -> Vec<DocumentBlock> {
    let segments = split_paragraphs(&summary.logical_paragraphs);

    let mut blocks = Vec::with_capacity(segments.len() + 3);
    blocks.push(DocumentBlock::heading(TRANSCRIPTION_HEADING));
    blocks.extend(segments.into_iter().map(DocumentBlock::paragraph));
    blocks.push(DocumentBlock::heading(SUMMARY_HEADING));
    blocks.push(DocumentBlock::paragraph(summary.summary.as_str()));
    blocks
}

// Wire format for the Notion pages API

#[derive(Debug, Serialize)]
pub(crate) struct RichText {
    text: TextContent,
}

#[derive(Debug, Serialize)]
struct TextContent {
    content: String,
}

impl RichText {
    pub(crate) fn plain(content: &str) -> Self {
        Self {
            text: TextContent {
                content: content.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BlockObject {
    object: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    paragraph: Option<BlockText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    heading_2: Option<BlockText>,
}

#[derive(Debug, Serialize)]
struct BlockText {
    rich_text: Vec<RichText>,
}

impl From<&DocumentBlock> for BlockObject {
    fn from(block: &DocumentBlock) -> Self {
        let body = Some(BlockText {
            rich_text: vec![RichText::plain(block.text())],
        });
        match block {
            DocumentBlock::Heading(_) => Self {
                object: "block",
                paragraph: None,
                heading_2: body,
            },
            DocumentBlock::Paragraph(_) => Self {
                object: "block",
                paragraph: body,
                heading_2: None,
            },
        }
    }
}
