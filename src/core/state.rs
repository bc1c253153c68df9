use std::fmt;

/// Lifecycle of a pool.
///
/// ```text
/// Created ──start()──► Running ──shutdown()/cancel──► Draining ──all results──► Stopped
///    └──────────────── shutdown()/cancel (no workers) ──────────────────────────────┘
/// ```
///
/// No job is accepted once `Draining` or `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// Built, workers not spawned yet. Submissions are staged.
    Created,
    /// Workers running, submissions accepted.
    Running,
    /// Submissions refused; staged and in-flight jobs finishing.
    Draining,
    /// Every accepted job has produced a result and all workers exited.
    Stopped,
}

impl PoolState {
    /// True while submissions are accepted.
    #[inline]
    pub fn is_accepting(self) -> bool {
        matches!(self, PoolState::Created | PoolState::Running)
    }

    /// Short stable label.
    pub fn as_str(self) -> &'static str {
        match self {
            PoolState::Created => "created",
            PoolState::Running => "running",
            PoolState::Draining => "draining",
            PoolState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
