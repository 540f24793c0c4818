use thiserror::Error;

use crate::job::{Job, Position};

/// Failure of a single job. Contained at the batch boundary.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("chunk slot {pos} is no longer live")]
    ChunkVanished { pos: Position },

    #[error("generation failed for slot {pos}: {reason}")]
    Generation { pos: Position, reason: String },

    #[error("{job} panicked: {message}")]
    Panicked { job: Job, message: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
