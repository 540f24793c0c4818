//! Chunk records stored in a tombstoned slot array.
//!
//! A record's index is its [`Position`]: the stable handle the rendering side
//! keys resources by. Evicted records are tombstoned (`slot == None`) rather
//! than removed, and the lowest free index is reused before the array grows.
//! A `ChunkCoord -> Position` map keeps lookups constant time.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;
use lumber_runtime::Position;
use lumber_world::{ChunkCoord, QualityTier};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderState {
    NotRendered,
    Rendering,
    Rendered,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkRecord {
    pub coord: ChunkCoord,
    pub quality: QualityTier,
    pub state: RenderState,
    /// `Some(position)` while live, `None` once tombstoned.
    pub slot: Option<Position>,
    /// Set once a job's geometry has been submitted for this record. Survives
    /// a failed reload, whose old sections stay in the sink.
    pub has_geometry: bool,
}

impl ChunkRecord {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.slot.is_some()
    }
}

#[derive(Debug, Default)]
pub struct ChunkTable {
    records: Vec<ChunkRecord>,
    index: HashMap<ChunkCoord, Position>,
    free: BTreeSet<Position>,
}

impl ChunkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            records: Vec::with_capacity(cap),
            index: HashMap::with_capacity(cap),
            free: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn lookup(&self, coord: ChunkCoord) -> Option<Position> {
        self.index.get(&coord).copied()
    }

    #[inline]
    pub fn is_live(&self, pos: Position) -> bool {
        self.records.get(pos).is_some_and(ChunkRecord::is_live)
    }

    /// Live record at `pos`.
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&ChunkRecord> {
        self.records.get(pos).filter(|r| r.is_live())
    }

    /// Returns the live position for `coord`, creating a `NotRendered` record
    /// in the lowest free slot (or a new one at the end) when absent. An
    /// existing record is left untouched.
    pub fn allocate(&mut self, coord: ChunkCoord, quality: QualityTier) -> Position {
        if let Some(pos) = self.lookup(coord) {
            return pos;
        }
        let pos = self.free.pop_first().unwrap_or(self.records.len());
        let record = ChunkRecord {
            coord,
            quality,
            state: RenderState::NotRendered,
            slot: Some(pos),
            has_geometry: false,
        };
        if pos == self.records.len() {
            self.records.push(record);
        } else {
            self.records[pos] = record;
        }
        self.index.insert(coord, pos);
        pos
    }

    /// Tombstones the record at `pos` and returns what it held. No-op on a
    /// dead or out-of-range position.
    pub fn evict(&mut self, pos: Position) -> Option<ChunkRecord> {
        let record = self.records.get_mut(pos).filter(|r| r.is_live())?;
        let before = *record;
        record.slot = None;
        record.state = RenderState::NotRendered;
        record.has_geometry = false;
        self.index.remove(&before.coord);
        self.free.insert(pos);
        Some(before)
    }

    pub fn set_state(&mut self, pos: Position, state: RenderState) -> bool {
        match self.records.get_mut(pos).filter(|r| r.is_live()) {
            Some(r) => {
                r.state = state;
                true
            }
            None => false,
        }
    }

    /// Moves a live record into `Rendering` at `quality`.
    pub fn begin_render(&mut self, pos: Position, quality: QualityTier) -> bool {
        match self.records.get_mut(pos).filter(|r| r.is_live()) {
            Some(r) => {
                r.quality = quality;
                r.state = RenderState::Rendering;
                true
            }
            None => false,
        }
    }

    /// Whether `pos` still holds `coord` and is waiting on a job.
    pub fn is_rendering(&self, pos: Position, coord: ChunkCoord) -> bool {
        self.get(pos)
            .is_some_and(|r| r.coord == coord && r.state == RenderState::Rendering)
    }

    /// Completes a job: `Rendering -> Rendered`, only if the slot still holds `coord`.
    pub fn mark_rendered(&mut self, pos: Position, coord: ChunkCoord) -> bool {
        if !self.is_rendering(pos, coord) {
            return false;
        }
        let r = &mut self.records[pos];
        r.state = RenderState::Rendered;
        r.has_geometry = true;
        true
    }

    /// Puts a `Rendering` record back to `NotRendered` after its job failed.
    /// Geometry from an earlier job is still owned by the slot.
    pub fn reset_failed(&mut self, pos: Position) -> bool {
        match self.records.get_mut(pos).filter(|r| r.is_live()) {
            Some(r) if r.state == RenderState::Rendering => {
                r.state = RenderState::NotRendered;
                true
            }
            _ => false,
        }
    }

    pub fn iter_live(&self) -> impl Iterator<Item = (Position, &ChunkRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_live())
    }

    /// Slots ever allocated, live or tombstoned.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn count_in_state(&self, state: RenderState) -> usize {
        self.iter_live().filter(|(_, r)| r.state == state).count()
    }
}

/// Shared handle to the table. Every method takes the lock for one short
/// operation; callers never hold it across generation work.
#[derive(Clone, Debug, Default)]
pub struct ChunkTableHandle {
    inner: Arc<Mutex<ChunkTable>>,
}

impl ChunkTableHandle {
    pub fn new(table: ChunkTable) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ChunkTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self, pos: Position) -> Option<ChunkRecord> {
        self.lock().get(pos).copied()
    }

    pub fn lookup(&self, coord: ChunkCoord) -> Option<Position> {
        self.lock().lookup(coord)
    }

    pub fn live_records(&self) -> Vec<(Position, ChunkRecord)> {
        self.lock().iter_live().map(|(p, r)| (p, *r)).collect()
    }
}
