//! Streaming generation core for Lumen.
//!
//! Sends a piece of text to a generation endpoint, receives the answer as a
//! stream of fragments, and reveals it one character at a time while keeping
//! a sectioned rendering of everything shown so far.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  events  ┌────────────────────────────────────┐  watch  ┌──────────┐
//! │ Transport  │ ───────▶ │ Session driver                     │ ──────▶ │ Renderer │
//! │ (HTTP)     │          │  IngestBuffer → Typewriter → format│         └──────────┘
//! └────────────┘          └────────────────────────────────────┘
//! ```
//!
//! - [`transport`]: request, retry, response decoding.
//! - [`buffer`]: bounded FIFO between network and reveal.
//! - [`typewriter`]: paced reveal and completion heuristic.
//! - [`formatter`]: pure text-to-sections rendering.
//! - [`session`]: lifecycle, cancellation and snapshots.

pub mod buffer;
pub mod config;
pub mod error;
pub mod formatter;
pub mod identity;
pub mod session;
pub mod transport;
pub mod typewriter;

pub use buffer::{IngestBuffer, OverflowPolicy};
pub use config::{BufferConfig, LumenConfig, TransportConfig, TypewriterConfig};
pub use error::{ConfigError, GenerationError, Result};
pub use formatter::{RenderedDocument, Section, format};
pub use identity::{EnvIdentity, IdentityProvider, StaticIdentity};
pub use session::{ErrorReport, GenerationId, GenerationSession, SessionSnapshot, SessionState};
pub use transport::{
    Fragment, GenerationRequest, HttpTransport, Transport, TransportEvent, TransportHandle,
    Utf8Decoder, classify_chunk,
};
pub use typewriter::{TickOutcome, TypewriterPhase, TypewriterScheduler, TypewriterTimings};
