//! Session state types and transitions.

use serde::Serialize;

/// Lifecycle of a generation session.
///
/// ```text
/// Idle ──start──▶ Requesting ──id/chunk──▶ Streaming ──end marker──▶ Draining
///                     │                        │                        │
///                     └──── failure ───────────┴───────▶ Errored        │
///                                              └──── drained ──▶ Finished ◀┘
/// ```
///
/// `cancel` from any active state returns to `Idle`, and `start` from any
/// state begins a new run in `Requesting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing running.
    #[default]
    Idle,
    /// Request sent, nothing received yet.
    Requesting,
    /// Receiving and revealing content.
    Streaming,
    /// End marker received, pending characters are still being revealed.
    Draining,
    /// The run completed.
    Finished,
    /// The run failed; revealed content is kept.
    Errored,
}

impl SessionState {
    /// Returns `true` while a run is in flight.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Requesting | Self::Streaming | Self::Draining)
    }

    /// Returns `true` for `Finished` and `Errored`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Errored)
    }

    /// Whether a blinking cursor should follow the revealed text.
    #[inline]
    pub fn shows_cursor(&self) -> bool {
        matches!(self, Self::Streaming | Self::Draining)
    }

    /// Whether the session may move from `self` to `next`.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            // A new run may start from anywhere.
            (_, Requesting) => true,
            // Cancellation.
            (Requesting | Streaming | Draining, Idle) => true,
            (Requesting, Streaming | Finished | Errored) => true,
            (Streaming, Streaming | Draining | Finished | Errored) => true,
            (Draining, Finished | Errored) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Finished => "finished",
            Self::Errored => "errored",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
