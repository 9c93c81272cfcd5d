use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::debug;

use crate::model::{Observation, StationId};

/// Append-only store of weather observations, queried per station.
///
/// Implementations must be safe to share between the importer and any number
/// of concurrent readers; a reader never sees a half-written observation.
pub trait ObservationStore: Send + Sync + Debug {
    /// Append an observation.
    ///
    /// Returns `false` when the observation is identical to the one currently
    /// returned for its station and timestamp, which makes retried imports of
    /// the same snapshot a no-op.
    fn ingest(&self, observation: Observation) -> bool;

    /// Observation with the greatest timestamp; among equal timestamps the most
    /// recently ingested one wins.
    fn latest(&self, station: StationId) -> Option<Observation>;

    /// Observation recorded at exactly `timestamp`. There is no fallback to an
    /// earlier snapshot: a timestamp that is off by one second is a miss.
    fn at_timestamp(&self, station: StationId, timestamp: i64) -> Option<Observation>;

    /// Every observation of a station, newest first.
    fn history(&self, station: StationId) -> Vec<Observation>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store keeping one timestamp-ordered sequence per station.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    stations: RwLock<HashMap<StationId, Vec<Observation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Each write is a single `Vec::insert`, so a poisoned lock still guards a
    // consistent sequence.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<StationId, Vec<Observation>>> {
        self.stations.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<StationId, Vec<Observation>>> {
        self.stations.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Index one past the last entry with `timestamp <= target`.
fn upper_bound(entries: &[Observation], target: i64) -> usize {
    entries.partition_point(|obs| obs.timestamp <= target)
}

impl ObservationStore for InMemoryStore {
    fn ingest(&self, observation: Observation) -> bool {
        let mut stations = self.write();
        let entries = stations.entry(observation.station).or_default();

        let end = upper_bound(entries, observation.timestamp);
        // Only the current winner at this timestamp counts as a duplicate, so a
        // re-ingested older value becomes the winner again.
        if end > 0 && entries[end - 1] == observation {
            debug!(
                station = %observation.station,
                timestamp = observation.timestamp,
                "Observation already stored, skipping"
            );
            return false;
        }

        // Inserting after equal timestamps keeps ingestion order among them.
        entries.insert(end, observation);
        true
    }

    fn latest(&self, station: StationId) -> Option<Observation> {
        self.read().get(&station).and_then(|entries| entries.last()).cloned()
    }

    fn at_timestamp(&self, station: StationId, timestamp: i64) -> Option<Observation> {
        let stations = self.read();
        let entries = stations.get(&station)?;
        let idx = upper_bound(entries, timestamp).checked_sub(1)?;
        entries.get(idx).filter(|obs| obs.timestamp == timestamp).cloned()
    }

    fn history(&self, station: StationId) -> Vec<Observation> {
        self.read()
            .get(&station)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }
}
