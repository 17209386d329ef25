//! Generation session orchestration.
//!
//! A [`GenerationSession`] turns one input into one paced, formatted result.
//! It wires the identity provider, the transport and the typewriter together
//! and exposes the outcome as a stream of [`SessionSnapshot`]s.
//!
//! # Overview
//!
//! - `start` validates the input, supersedes any running generation and
//!   spawns a driver task for the new run.
//! - The driver owns the typewriter and the transport handle; it is the only
//!   writer of run state.
//! - Renderers subscribe with [`GenerationSession::subscribe`] and redraw on
//!   every change.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut session = GenerationSession::new(transport, identity, LumenConfig::default());
//! let mut updates = session.subscribe();
//! session.start("Write an email to my landlord")?;
//!
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     render(&snapshot.display_document(), snapshot.cursor_visible());
//!     if snapshot.state.is_terminal() {
//!         break;
//!     }
//! }
//! ```

mod driver;
mod snapshot;
mod state;


pub use snapshot::{ErrorReport, GenerationId, SessionSnapshot};
pub use state::SessionState;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buffer::OverflowPolicy;
use crate::config::LumenConfig;
use crate::error::{GenerationError, Result};
use crate::identity::IdentityProvider;
use crate::transport::{GenerationRequest, Transport};
use crate::typewriter::{TypewriterScheduler, TypewriterTimings};

use driver::{RunCommand, RunDriver};

/// Bookkeeping for the run currently owned by the session.
struct ActiveRun {
    run_id: u64,
    cancel: CancellationToken,
    transport_cancel: CancellationToken,
    commands: mpsc::UnboundedSender<RunCommand>,
    task: JoinHandle<()>,
}

impl ActiveRun {
    fn stop(&self) {
        self.cancel.cancel();
        self.transport_cancel.cancel();
        self.task.abort();
    }
}

/// Orchestrates one generation at a time.
///
/// Must be used from within a Tokio runtime.
pub struct GenerationSession {
    transport: Arc<dyn Transport>,
    identity: Arc<dyn IdentityProvider>,
    timings: TypewriterTimings,
    policy: OverflowPolicy,
    snapshots: watch::Sender<SessionSnapshot>,
    active: Option<ActiveRun>,
    next_run_id: u64,
}

impl std::fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSession")
            .field("state", &self.state())
            .field("run_id", &self.snapshots.borrow().run_id)
            .field("timings", &self.timings)
            .finish()
    }
}

impl GenerationSession {
    pub fn new(
        transport: Arc<dyn Transport>,
        identity: Arc<dyn IdentityProvider>,
        config: LumenConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            transport,
            identity,
            timings: TypewriterTimings::from(config.typewriter),
            policy: OverflowPolicy::from(config.buffer),
            snapshots,
            active: None,
            next_run_id: 0,
        }
    }

    // --------------------------------------------------------
    // Operations
    // --------------------------------------------------------

    /// Starts a generation for `input` and returns its run id.
    ///
    /// Blank input is rejected with [`GenerationError::EmptyInput`] and leaves
    /// the session untouched. Otherwise any running generation is cancelled
    /// and its output discarded. A transport that refuses to start (for
    /// example [`GenerationError::AuthMissing`]) moves the session to
    /// [`SessionState::Errored`] and the error is also returned.
    pub fn start(&mut self, input: &str) -> Result<u64> {
        if input.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        if let Some(previous) = self.active.take() {
            debug!(run_id = previous.run_id, "Superseding running generation");
            previous.stop();
        }

        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.snapshots
            .send_replace(SessionSnapshot::requesting(run_id));
        info!(run_id, input_chars = input.chars().count(), "Starting generation");

        let request = GenerationRequest::new(input, self.identity.identity());
        let handle = match self.transport.start(request) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(run_id, error = %err, "Generation could not start");
                let report = ErrorReport::from(err.clone());
                self.snapshots.send_modify(|snapshot| {
                    snapshot.state = SessionState::Errored;
                    snapshot.error = Some(report);
                });
                return Err(err);
            }
        };

        let cancel = CancellationToken::new();
        let transport_cancel = handle.cancellation_token();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let driver = RunDriver::new(
            run_id,
            TypewriterScheduler::new(self.timings, self.policy),
            handle,
            self.snapshots.clone(),
            command_rx,
            cancel.clone(),
        );
        let task = tokio::spawn(driver.run());

        self.active = Some(ActiveRun {
            run_id,
            cancel,
            transport_cancel,
            commands,
            task,
        });
        Ok(run_id)
    }

    /// Cancels the running generation.
    ///
    /// The revealed document stays visible and the session returns to
    /// [`SessionState::Idle`]. No snapshot of the cancelled run is published
    /// after this returns. Calling it again, or after the run finished, does
    /// nothing.
    pub fn cancel(&mut self) {
        let Some(run) = self.active.take() else {
            return;
        };
        run.stop();

        let cancelled = self.snapshots.send_if_modified(|snapshot| {
            if snapshot.run_id != run.run_id || !snapshot.state.is_active() {
                return false;
            }
            snapshot.state = SessionState::Idle;
            snapshot.pending_chars = 0;
            true
        });
        if cancelled {
            info!(run_id = run.run_id, "Generation cancelled");
        }
    }

    /// Reveals all buffered characters of the running generation at once.
    pub fn skip_animation(&self) {
        if let Some(run) = &self.active {
            let _ = run.commands.send(RunCommand::SkipAnimation);
        }
    }

    // --------------------------------------------------------
    // Observation
    // --------------------------------------------------------

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshots.borrow().state
    }

    /// Returns `true` while a generation is in flight.
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Id of the most recent run, `0` before the first `start`.
    pub fn run_id(&self) -> u64 {
        self.snapshots.borrow().run_id
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.stop();
        }
    }
}
