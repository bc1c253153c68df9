//! # Event subscribers for the pool.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out that delivers [`Event`](crate::Event)s to every subscriber without
//! blocking publishers.
//!
//! ## Architecture
//! ```text
//!   Pool / Worker ── publish(Event) ──► Bus ──► pool listener ──► SubscriberSet::emit
//!                                                                  ├──► [queue S1] ─► worker ─► S1.on_event()
//!                                                                  ├──► [queue S2] ─► worker ─► S2.on_event()
//!                                                                  └──► [queue SN] ─► worker ─► SN.on_event()
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use taskpool::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::JobFailed {
//!             // increment failure counter
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failures" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
