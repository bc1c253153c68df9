//! Pool core: coordination and worker lifecycle.
//!
//! The only public API from this module is [`Pool`] (plus its builder and the
//! state enums); everything else is wiring.
//!
//! Internal modules:
//! - [`pool`]: coordinator state machine, admission, drain and cancellation;
//! - [`builder`]: assembles a pool and its event plumbing;
//! - [`worker`]: one worker loop (dequeue → execute → publish result);
//! - [`runner`]: executes one attempt with panic isolation and timeout;
//! - [`tracker`]: per-worker state snapshots;
//! - [`state`]: pool lifecycle states.

mod builder;
mod pool;
mod runner;
mod state;
mod tracker;
mod worker;

pub use builder::PoolBuilder;
pub use pool::{Admission, Pool};
pub use state::PoolState;
pub use tracker::WorkerState;
