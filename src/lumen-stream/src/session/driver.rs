//! Per-run task owning the typewriter and the transport.
//!
//! All mutation of a run happens on this task, so transport events, ticks and
//! commands are naturally serialized. The task publishes through a
//! [`watch::Sender`] and never publishes once its run is cancelled or
//! superseded.

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::snapshot::{ErrorReport, GenerationId, SessionSnapshot};
use super::state::SessionState;
use crate::error::GenerationError;
use crate::transport::{TransportEvent, TransportHandle};
use crate::typewriter::{TickOutcome, TypewriterScheduler};

/// Requests from the session to a running driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunCommand {
    /// Reveal everything that is buffered at once.
    SkipAnimation,
}

pub(crate) struct RunDriver {
    run_id: u64,
    state: SessionState,
    scheduler: TypewriterScheduler,
    transport: TransportHandle,
    transport_open: bool,
    generation_id: Option<GenerationId>,
    started_at: Instant,
    first_chunk_at: Option<Instant>,
    snapshots: watch::Sender<SessionSnapshot>,
    commands: mpsc::UnboundedReceiver<RunCommand>,
    cancel: CancellationToken,
}

impl RunDriver {
    pub(crate) fn new(
        run_id: u64,
        scheduler: TypewriterScheduler,
        transport: TransportHandle,
        snapshots: watch::Sender<SessionSnapshot>,
        commands: mpsc::UnboundedReceiver<RunCommand>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run_id,
            state: SessionState::Requesting,
            scheduler,
            transport,
            transport_open: true,
            generation_id: None,
            started_at: Instant::now(),
            first_chunk_at: None,
            snapshots,
            commands,
            cancel,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let deadline = self.scheduler.next_deadline();

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    self.transport.cancel();
                    self.scheduler.cancel();
                    debug!(run_id = self.run_id, "Run cancelled");
                    break;
                }

                Some(command) = self.commands.recv() => {
                    self.handle_command(command);
                }

                event = self.transport.next_event(), if self.transport_open => {
                    let done = match event {
                        Some(event) => self.handle_transport_event(event),
                        // Sender gone without a terminal event: treat as end of stream.
                        None => self.handle_transport_event(TransportEvent::Finished),
                    };
                    if done {
                        break;
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.scheduler.on_deadline(Instant::now()) == TickOutcome::Completed {
                        self.complete();
                        break;
                    }
                    self.publish();
                }
            }
        }
    }

    fn handle_command(&mut self, command: RunCommand) {
        match command {
            RunCommand::SkipAnimation => {
                self.scheduler.skip();
                self.publish();
            }
        }
    }

    /// Returns `true` when the run is over.
    fn handle_transport_event(&mut self, event: TransportEvent) -> bool {
        let now = Instant::now();
        match event {
            TransportEvent::Id(raw) => {
                if self.generation_id.is_none() {
                    debug!(run_id = self.run_id, id = %raw, "Generation id received");
                    self.generation_id = Some(GenerationId::new(raw));
                }
                self.transition(SessionState::Streaming);
                self.publish();
                false
            }
            TransportEvent::Chunk(text) => {
                if self.first_chunk_at.is_none() {
                    self.first_chunk_at = Some(now);
                }
                self.scheduler.feed(&text, now);
                self.transition(SessionState::Streaming);
                self.publish();
                false
            }
            TransportEvent::Finished => {
                self.transport_open = false;
                self.scheduler.finish(now);
                if self.scheduler.is_complete() {
                    self.complete();
                    return true;
                }
                self.transition(SessionState::Draining);
                self.publish();
                false
            }
            TransportEvent::Failed(err) => {
                self.transport_open = false;
                self.fail(err);
                true
            }
        }
    }

    fn complete(&mut self) {
        self.transport.cancel();
        self.transition(SessionState::Finished);
        self.publish();
        info!(
            run_id = self.run_id,
            chars = self.scheduler.revealed_chars(),
            dropped = self.scheduler.dropped_chars(),
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "Generation finished"
        );
    }

    fn fail(&mut self, err: GenerationError) {
        self.scheduler.cancel();
        self.transition(SessionState::Errored);
        error!(
            run_id = self.run_id,
            error = %err,
            requires_login = err.requires_login(),
            revealed = self.scheduler.revealed_chars(),
            "Generation failed"
        );
        let report = ErrorReport::from(err);
        self.publish_with(|snapshot| snapshot.error = Some(report));
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        if self.state.can_transition_to(next) {
            debug!(run_id = self.run_id, from = %self.state, to = %next, "Session transition");
            self.state = next;
        } else {
            debug!(run_id = self.run_id, from = %self.state, to = %next, "Ignoring transition");
        }
    }

    fn publish(&self) {
        self.publish_with(|_| {});
    }

    fn publish_with(&self, extra: impl FnOnce(&mut SessionSnapshot)) {
        let cancel = &self.cancel;
        let run_id = self.run_id;
        self.snapshots.send_if_modified(|snapshot| {
            if cancel.is_cancelled() || snapshot.run_id != run_id {
                return false;
            }
            snapshot.state = self.state;
            snapshot.full_content.clear();
            snapshot.full_content.push_str(self.scheduler.full_content());
            snapshot.document = self.scheduler.document().clone();
            snapshot.pending_chars = self.scheduler.pending();
            snapshot.dropped_chars = self.scheduler.dropped_chars();
            snapshot.generation_id = self.generation_id.clone();
            snapshot.time_to_first_chunk = self
                .first_chunk_at
                .map(|at| at.saturating_duration_since(self.started_at));
            extra(snapshot);
            true
        });
    }
}
