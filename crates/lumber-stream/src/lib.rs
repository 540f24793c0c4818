//! Chunk streaming around a moving observer: slot table, LOD policy, and the
//! single-flight scan feeding the job batcher.
#![forbid(unsafe_code)]

mod boundary;
mod error;
mod generator;
pub mod lod;
mod streamer;
pub mod table;
mod timer;

pub use boundary::{
    ChunkCenteredObserver, ChunkListener, NoopListener, ObserverSource, RenderSink,
    SharedObserver,
};
pub use error::StreamError;
pub use generator::{ChunkGenerator, ChunkGeometry, GeometrySource, MainTask, TerrainGeometry};
pub use lod::{LodPolicy, quality_for};
pub use lumber_runtime::{Job, JobError, Position};
pub use streamer::{PumpReport, ScanReport, StreamStats, Streamer};
pub use table::{ChunkRecord, ChunkTable, ChunkTableHandle, RenderState};
pub use timer::ScanTimer;
