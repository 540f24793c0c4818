use std::fmt;

use crate::error::JobError;

/// Stable slot index of a chunk record; also keys its rendering resource.
pub type Position = usize;

/// Deferred chunk work. Both variants run the same generation body; `Reload`
/// re-keys onto an existing slot so the rendering resource index is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Job {
    Load { pos: Position },
    Reload { pos: Position },
}

impl Job {
    #[inline]
    pub fn pos(&self) -> Position {
        match *self {
            Job::Load { pos } | Job::Reload { pos } => pos,
        }
    }

    #[inline]
    pub fn is_reload(&self) -> bool {
        matches!(self, Job::Reload { .. })
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Load { pos } => write!(f, "load#{pos}"),
            Job::Reload { pos } => write!(f, "reload#{pos}"),
        }
    }
}

/// Executes jobs on batch worker threads.
pub trait JobHandler: Send + Sync + 'static {
    fn run(&self, job: Job) -> Result<(), JobError>;

    /// Called on the worker after `run` returned an error or panicked.
    fn on_failure(&self, _job: Job, _err: &JobError) {}
}
