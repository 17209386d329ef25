//! Ingest buffer between the network producer and the typewriter consumer.

use std::collections::VecDeque;

use crate::config::BufferConfig;

/// Compaction rule applied before each append.
///
/// When more than `high_water` characters are waiting, only the most recent
/// `retain` are kept. The dropped characters were never revealed, so the
/// revealed text stays intact; only a prefix of the backlog is lost.
///
/// A `retain` above `high_water` behaves as if it were `high_water`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowPolicy {
    pub high_water: usize,
    pub retain: usize,
}

impl OverflowPolicy {
    pub fn new(high_water: usize, retain: usize) -> Self {
        Self {
            high_water,
            retain: retain.min(high_water),
        }
    }

    fn effective_retain(&self) -> usize {
        self.retain.min(self.high_water)
    }
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        Self::from(BufferConfig::default())
    }
}

impl From<BufferConfig> for OverflowPolicy {
    fn from(config: BufferConfig) -> Self {
        Self::new(config.high_water_chars, config.retain_chars)
    }
}

/// Character queue with single-writer, single-reader semantics.
///
/// Characters come out of [`IngestBuffer::drain_one`] in exactly the order
/// they went into [`IngestBuffer::append`], except for the prefix removed by
/// the [`OverflowPolicy`].
#[derive(Debug, Clone, Default)]
pub struct IngestBuffer {
    chars: VecDeque<char>,
    policy: OverflowPolicy,
    dropped: usize,
}

impl IngestBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: OverflowPolicy) -> Self {
        Self {
            chars: VecDeque::new(),
            policy,
            dropped: 0,
        }
    }

    /// Appends text, compacting the backlog first if it is over the high
    /// water mark.
    pub fn append(&mut self, text: &str) {
        if self.chars.len() > self.policy.high_water {
            let excess = self.chars.len() - self.policy.effective_retain();
            self.chars.drain(..excess);
            self.dropped += excess;
            tracing::warn!(
                dropped = excess,
                retained = self.chars.len(),
                "Ingest buffer over high water mark, dropped oldest pending characters"
            );
        }
        self.chars.extend(text.chars());
    }

    /// Removes and returns the oldest pending character.
    pub fn drain_one(&mut self) -> Option<char> {
        self.chars.pop_front()
    }

    /// Removes every pending character, oldest first.
    pub fn drain_all(&mut self) -> String {
        self.chars.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Number of pending characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Total characters discarded by compaction since creation or the last
    /// [`IngestBuffer::clear`].
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Discards pending characters and resets the drop counter.
    pub fn clear(&mut self) {
        self.chars.clear();
        self.dropped = 0;
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}
