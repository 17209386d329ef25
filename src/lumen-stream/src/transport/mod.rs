//! Network transport for generation requests.
//!
//! A [`Transport`] opens one streamed generation and reports what happens
//! through [`TransportEvent`]s: the identifier once it is known, each text
//! delta, and exactly one terminal event ([`TransportEvent::Finished`] or
//! [`TransportEvent::Failed`]). The transport does no buffering of its own;
//! pacing is the typewriter's job.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  TransportEvent   ┌──────────────┐
//! │ Transport task│ ────────────────▶ │ Session loop │
//! └───────────────┘   (mpsc, ordered) └──────────────┘
//!         ▲                                  │
//!         └──────── CancellationToken ───────┘
//! ```

mod decode;
mod fragment;
mod http;

pub use decode::Utf8Decoder;
pub use fragment::{Fragment, classify_chunk};
pub use http::HttpTransport;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{GenerationError, Result};

/// Capacity of the event channel between a transport task and its consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What the transport sends for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Text the user asked about.
    pub content: String,
    /// Identity token supplied by the caller, if any.
    pub identity: Option<String>,
}

impl GenerationRequest {
    pub fn new(content: impl Into<String>, identity: Option<String>) -> Self {
        Self {
            content: content.into(),
            identity,
        }
    }

    /// Returns the identity token, or [`GenerationError::AuthMissing`] if it
    /// is absent or blank.
    pub fn require_identity(&self) -> Result<&str> {
        self.identity
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(GenerationError::AuthMissing)
    }
}

/// Events emitted by a running transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Identifier of the generation, sent at most once.
    Id(String),
    /// A non-empty text delta.
    Chunk(String),
    /// The response body ended cleanly.
    Finished,
    /// The generation failed after any allowed retry.
    Failed(GenerationError),
}

impl TransportEvent {
    /// Returns `true` for [`TransportEvent::Finished`] and
    /// [`TransportEvent::Failed`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed(_))
    }
}

/// Capability to start streamed generations.
///
/// `start` must be called from within a Tokio runtime. Implementations
/// validate the request synchronously, so a missing identity is reported
/// before anything touches the network.
pub trait Transport: Send + Sync {
    fn start(&self, request: GenerationRequest) -> Result<TransportHandle>;
}

/// Handle to one running transport.
///
/// Dropping the handle cancels the transport.
#[derive(Debug)]
pub struct TransportHandle {
    events: mpsc::Receiver<TransportEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TransportHandle {
    pub fn new(events: mpsc::Receiver<TransportEvent>, cancel: CancellationToken) -> Self {
        Self {
            events,
            cancel,
            task: None,
        }
    }

    /// Attach the task driving the transport.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    /// Receives the next event.
    ///
    /// Returns `None` once the transport is cancelled or has stopped sending.
    /// Nothing is delivered after [`TransportHandle::cancel`], even if the
    /// task already queued more events.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Aborts the connection and any pending retry timer.
    ///
    /// Safe to call repeatedly and after the transport has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that cancels this transport; clones share the same state.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns `true` once the driving task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_identity() {
        let request = GenerationRequest::new("hi", Some("user-1".into()));
        assert_eq!(request.require_identity().unwrap(), "user-1");

        let blank = GenerationRequest::new("hi", Some("   ".into()));
        assert_eq!(blank.require_identity(), Err(GenerationError::AuthMissing));

        let none = GenerationRequest::new("hi", None);
        assert_eq!(none.require_identity(), Err(GenerationError::AuthMissing));
    }

    #[test]
    fn test_terminal_events() {
        assert!(TransportEvent::Finished.is_terminal());
        assert!(TransportEvent::Failed(GenerationError::AuthMissing).is_terminal());
        assert!(!TransportEvent::Chunk("x".into()).is_terminal());
        assert!(!TransportEvent::Id("1".into()).is_terminal());
    }

    #[tokio::test]
    async fn test_no_events_after_cancel() {
        let (tx, rx) = mpsc::channel(4);
        let mut handle = TransportHandle::new(rx, CancellationToken::new());

        tx.send(TransportEvent::Chunk("a".into())).await.unwrap();
        assert_eq!(
            handle.next_event().await,
            Some(TransportEvent::Chunk("a".into()))
        );

        tx.send(TransportEvent::Chunk("b".into())).await.unwrap();
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test]
    async fn test_drop_cancels_token() {
        let (_tx, rx) = mpsc::channel(1);
        let handle = TransportHandle::new(rx, CancellationToken::new());
        let token = handle.cancellation_token();
        assert!(handle.is_finished());
        drop(handle);
        assert!(token.is_cancelled());
    }
}
