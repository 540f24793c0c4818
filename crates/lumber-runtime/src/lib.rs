//! Bounded job batching on a background worker pool.
#![forbid(unsafe_code)]

mod batcher;
mod error;
mod job;

pub use batcher::{BatchStatus, JobBatcher};
pub use error::{JobError, RuntimeError};
pub use job::{Job, JobHandler, Position};
