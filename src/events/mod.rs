//! Pool events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the coordinator, the
//! workers and the subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast` that stamps sequence numbers
//!
//! ## Quick reference
//! - **Publishers**: `Pool` (submit/drain/stop), `Worker` (start/stop/job
//!   outcome), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the pool's subscriber listener, which fans out to the
//!   `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
