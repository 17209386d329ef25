//! Typewriter state machine.

use std::time::Duration;

use tokio::time::Instant;

use crate::buffer::{IngestBuffer, OverflowPolicy};
use crate::config::TypewriterConfig;
use crate::formatter::{self, RenderedDocument};

/// Timing parameters of the reveal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTimings {
    /// Delay between two revealed characters.
    pub tick_interval: Duration,
    /// Silence after the last feed after which the stream counts as done.
    pub idle_threshold: Duration,
    /// Delay before re-running the idle check.
    pub recheck_grace: Duration,
}

impl Default for TypewriterTimings {
    fn default() -> Self {
        Self::from(TypewriterConfig::default())
    }
}

impl From<TypewriterConfig> for TypewriterTimings {
    fn from(config: TypewriterConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            idle_threshold: config.idle_threshold(),
            recheck_grace: config.recheck_grace(),
        }
    }
}

/// Where the reveal loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypewriterPhase {
    /// Nothing fed yet.
    Idle,
    /// A tick is scheduled.
    Ticking,
    /// The buffer ran dry; an idle re-check is scheduled.
    AwaitingRecheck,
    /// The stream is complete. No more deadlines.
    Complete,
    /// Stopped by [`TypewriterScheduler::cancel`].
    Cancelled,
}

/// Result of [`TypewriterScheduler::on_deadline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No deadline was due.
    NotDue,
    /// One character moved into the revealed text.
    Revealed(char),
    /// The buffer is empty but the stream is not done yet.
    Waiting,
    /// The stream is complete.
    Completed,
}

/// Single-consumer reveal loop over an [`IngestBuffer`].
///
/// At most one deadline is pending at any time, so feeding while a tick is
/// scheduled never starts a second loop.
#[derive(Debug, Clone)]
pub struct TypewriterScheduler {
    timings: TypewriterTimings,
    buffer: IngestBuffer,
    full_content: String,
    revealed_chars: usize,
    document: RenderedDocument,
    phase: TypewriterPhase,
    deadline: Option<Instant>,
    last_feed: Option<Instant>,
    finish_received: bool,
}

impl Default for TypewriterScheduler {
    fn default() -> Self {
        Self::new(TypewriterTimings::default(), OverflowPolicy::default())
    }
}

impl TypewriterScheduler {
    pub fn new(timings: TypewriterTimings, policy: OverflowPolicy) -> Self {
        Self {
            timings,
            buffer: IngestBuffer::with_policy(policy),
            full_content: String::new(),
            revealed_chars: 0,
            document: RenderedDocument::empty(),
            phase: TypewriterPhase::Idle,
            deadline: None,
            last_feed: None,
            finish_received: false,
        }
    }

    // --------------------------------------------------------
    // Inputs
    // --------------------------------------------------------

    /// Queues `text` for reveal and starts the loop if it is not running.
    ///
    /// Ignored once the scheduler is complete or cancelled.
    pub fn feed(&mut self, text: &str, now: Instant) {
        if self.is_stopped() {
            tracing::debug!(len = text.len(), "Dropping fragment fed after completion");
            return;
        }

        self.buffer.append(text);
        self.last_feed = Some(now);

        if self.phase != TypewriterPhase::Ticking {
            self.phase = TypewriterPhase::Ticking;
            self.deadline = Some(now);
        }
    }

    /// Records that the producer sent its end marker.
    ///
    /// Completes at once when nothing is left to reveal and no tick is
    /// pending; otherwise the next empty tick completes the stream.
    pub fn finish(&mut self, now: Instant) {
        if self.is_stopped() {
            return;
        }
        self.finish_received = true;
        if matches!(
            self.phase,
            TypewriterPhase::Idle | TypewriterPhase::AwaitingRecheck
        ) {
            self.idle_check(now);
        }
    }

    /// Moves every pending character into the revealed text at once.
    pub fn skip(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let rest = self.buffer.drain_all();
        self.revealed_chars += rest.chars().count();
        self.full_content.push_str(&rest);
        self.document = formatter::format(&self.full_content);
    }

    /// Stops the loop and discards undrained characters.
    ///
    /// Revealed text and the document are kept.
    pub fn cancel(&mut self) {
        self.buffer.clear();
        self.deadline = None;
        self.phase = TypewriterPhase::Cancelled;
    }

    /// When the next tick or re-check is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Runs the tick or re-check that is due at `now`.
    pub fn on_deadline(&mut self, now: Instant) -> TickOutcome {
        match self.deadline {
            Some(deadline) if deadline <= now => {}
            _ => return TickOutcome::NotDue,
        }
        self.deadline = None;

        match self.phase {
            TypewriterPhase::Ticking => self.tick(now),
            TypewriterPhase::AwaitingRecheck => self.idle_check(now),
            _ => TickOutcome::NotDue,
        }
    }

    // --------------------------------------------------------
    // Loop
    // --------------------------------------------------------

    fn tick(&mut self, now: Instant) -> TickOutcome {
        match self.buffer.drain_one() {
            Some(ch) => {
                self.full_content.push(ch);
                self.revealed_chars += 1;
                self.document = formatter::format(&self.full_content);
                self.deadline = Some(now + self.timings.tick_interval);
                TickOutcome::Revealed(ch)
            }
            None => self.idle_check(now),
        }
    }

    fn idle_check(&mut self, now: Instant) -> TickOutcome {
        let silent_for = self
            .last_feed
            .map_or(Duration::MAX, |at| now.saturating_duration_since(at));

        if self.finish_received || silent_for > self.timings.idle_threshold {
            self.phase = TypewriterPhase::Complete;
            self.deadline = None;
            tracing::debug!(
                revealed = self.revealed_chars,
                finish_received = self.finish_received,
                "Typewriter complete"
            );
            TickOutcome::Completed
        } else {
            self.phase = TypewriterPhase::AwaitingRecheck;
            self.deadline = Some(now + self.timings.recheck_grace);
            TickOutcome::Waiting
        }
    }

    // --------------------------------------------------------
    // Accessors
    // --------------------------------------------------------

    /// Everything revealed so far.
    pub fn full_content(&self) -> &str {
        &self.full_content
    }

    /// Document rendered from [`TypewriterScheduler::full_content`].
    pub fn document(&self) -> &RenderedDocument {
        &self.document
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.phase
    }

    /// Characters waiting in the buffer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn revealed_chars(&self) -> usize {
        self.revealed_chars
    }

    /// Characters lost to buffer compaction.
    pub fn dropped_chars(&self) -> usize {
        self.buffer.dropped()
    }

    pub fn finish_received(&self) -> bool {
        self.finish_received
    }

    pub fn last_feed(&self) -> Option<Instant> {
        self.last_feed
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TypewriterPhase::Complete
    }

    fn is_stopped(&self) -> bool {
        matches!(
            self.phase,
            TypewriterPhase::Complete | TypewriterPhase::Cancelled
        )
    }

    pub fn timings(&self) -> TypewriterTimings {
        self.timings
    }
}
