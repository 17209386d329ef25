//! Sectioned rendering of generated text.
//!
//! [`format`] turns the revealed text into a [`RenderedDocument`]: blocks
//! separated by a blank line become sections, and a leading `Title:` prefix
//! becomes the section title. The function is pure, so calling it again on
//! the same text always yields an equal document.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Prefix of the notice shown when a generation fails.
pub const FAILURE_PREFIX: &str = "Generation failed: ";

/// One titled block of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Section {
    /// Text before the first colon of the block, trimmed. Empty when the block
    /// has no colon.
    pub title: String,
    /// Trimmed, non-empty lines of the block body.
    pub content: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }

    /// Returns `true` if the section has no title.
    pub fn is_untitled(&self) -> bool {
        self.title.is_empty()
    }
}

/// Structured view of the generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub sections: Vec<Section>,
}

impl RenderedDocument {
    /// The empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single untitled section announcing a failure.
    pub fn failure_notice(message: &str) -> Self {
        Self {
            sections: vec![Section::new("", vec![format!("{FAILURE_PREFIX}{message}")])],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Looks up the first section with the given title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Renders the document back to plain text, one `Title:` header per
    /// section followed by its lines.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            if !section.is_untitled() {
                out.push_str(&section.title);
                out.push_str(":\n");
            }
            for line in &section.content {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Formats raw text into a [`RenderedDocument`].
///
/// - Blocks are separated by `"\n\n"`; whitespace-only blocks are skipped.
/// - Identical blocks are kept once, in first-seen order.
/// - `title` is the text before the first colon, the remainder is the body.
///   Without a colon the whole block is the body and the title is empty.
/// - The body is split into trimmed, non-empty lines.
pub fn format(text: &str) -> RenderedDocument {
    if text.trim().is_empty() {
        return RenderedDocument::empty();
    }

    let mut seen = HashSet::new();
    let sections = text
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .filter(|block| seen.insert(*block))
        .map(parse_block)
        .collect();

    RenderedDocument { sections }
}

fn parse_block(block: &str) -> Section {
    match block.split_once(':') {
        Some((title, body)) => Section::new(title.trim(), split_lines(body)),
        None => Section::new("", split_lines(block)),
    }
}

fn split_lines(body: &str) -> Vec<String> {
    body.trim()
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
