//! Paced character reveal.
//!
//! The [`TypewriterScheduler`] moves characters from the ingest buffer into
//! the revealed text one at a time, re-rendering the document after each
//! character. It owns no timers: the caller asks for
//! [`TypewriterScheduler::next_deadline`], sleeps until then, and calls
//! [`TypewriterScheduler::on_deadline`]. That keeps the state machine
//! testable with plain [`tokio::time::Instant`] values.
//!
//! # Lifecycle
//!
//! ```text
//!           feed                 buffer empty
//!   Idle ──────────▶ Ticking ───────────────────▶ idle check
//!    ▲                 ▲                          │       │
//!    │                 └──────── feed ────────────┤       │ finish seen, or
//!    │                                            │       │ silent > threshold
//!    │                            AwaitingRecheck ◀       ▼
//!    │                                                 Complete
//!    └─ (fresh scheduler per generation)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let mut scheduler = TypewriterScheduler::new(TypewriterTimings::default(), OverflowPolicy::default());
//! scheduler.feed("Goal: write", Instant::now());
//! while let Some(deadline) = scheduler.next_deadline() {
//!     tokio::time::sleep_until(deadline).await;
//!     if scheduler.on_deadline(Instant::now()) == TickOutcome::Completed {
//!         break;
//!     }
//! }
//! ```

mod scheduler;


pub use scheduler::{TickOutcome, TypewriterPhase, TypewriterScheduler, TypewriterTimings};
