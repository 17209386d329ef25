//! Observable view of a session.

use std::time::Duration;

use serde::Serialize;

use super::state::SessionState;
use crate::error::GenerationError;
use crate::formatter::RenderedDocument;

/// Identifier of a generation as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First run of ASCII digits in the identifier, for short display.
    ///
    /// `"prompt-42-b7"` gives `Some("42")`; an identifier without digits gives
    /// `None`.
    pub fn numeric(&self) -> Option<&str> {
        let start = self.0.find(|c: char| c.is_ascii_digit())?;
        let rest = &self.0[start..];
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        Some(&rest[..len])
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why the last run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Human readable message.
    pub message: String,
    /// The caller should send the user to the login flow.
    pub requires_login: bool,
    #[serde(skip)]
    pub error: GenerationError,
}

impl From<GenerationError> for ErrorReport {
    fn from(error: GenerationError) -> Self {
        Self {
            message: error.to_string(),
            requires_login: error.requires_login(),
            error,
        }
    }
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Increments on every `start`; events of older runs are ignored.
    pub run_id: u64,
    pub state: SessionState,
    /// Document rendered from `full_content`.
    pub document: RenderedDocument,
    /// Revealed text so far.
    pub full_content: String,
    pub generation_id: Option<GenerationId>,
    pub error: Option<ErrorReport>,
    /// Characters received but not revealed yet.
    pub pending_chars: usize,
    /// Characters discarded by buffer compaction.
    pub dropped_chars: usize,
    /// Time from `start` to the first content fragment.
    pub time_to_first_chunk: Option<Duration>,
}

impl SessionSnapshot {
    /// Fresh snapshot for a run that just sent its request.
    pub(crate) fn requesting(run_id: u64) -> Self {
        Self {
            run_id,
            state: SessionState::Requesting,
            ..Self::default()
        }
    }

    pub fn cursor_visible(&self) -> bool {
        self.state.shows_cursor()
    }

    pub fn revealed_chars(&self) -> usize {
        self.full_content.chars().count()
    }

    /// Document to show: the failure notice when the run errored before any
    /// text was revealed, the rendered document otherwise.
    pub fn display_document(&self) -> RenderedDocument {
        match &self.error {
            Some(report) if self.state == SessionState::Errored && self.document.is_empty() => {
                RenderedDocument::failure_notice(&report.message)
            }
            _ => self.document.clone(),
        }
    }
}
