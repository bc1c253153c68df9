use std::fmt;

use thiserror::Error;

/// Error returned by [`WorkQueue`](super::WorkQueue) enqueue operations.
///
/// The rejected item is handed back to the caller.
#[derive(Error, PartialEq, Eq)]
pub enum EnqueueError<T> {
    /// Queue at capacity (non-blocking enqueue only).
    #[error("queue full")]
    Full(T),

    /// Queue closed; no further items accepted.
    #[error("queue closed")]
    Closed(T),

    /// The caller's stop token fired while waiting for space.
    #[error("enqueue cancelled")]
    Cancelled(T),
}

impl<T> EnqueueError<T> {
    /// Returns the rejected item.
    pub fn into_inner(self) -> T {
        match self {
            EnqueueError::Full(t) | EnqueueError::Closed(t) | EnqueueError::Cancelled(t) => t,
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self, EnqueueError::Full(_))
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, EnqueueError::Closed(_))
    }
}

impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnqueueError::Full(_) => f.write_str("Full(..)"),
            EnqueueError::Closed(_) => f.write_str("Closed(..)"),
            EnqueueError::Cancelled(_) => f.write_str("Cancelled(..)"),
        }
    }
}
