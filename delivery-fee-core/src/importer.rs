use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    feed::{FeedError, ObservationFeed},
    model::Observation,
    store::ObservationStore,
};

/// What a single import cycle stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub timestamp: i64,
    /// Number of observations that were new to the store.
    pub ingested: usize,
    pub observations: Vec<Observation>,
}

impl ImportReport {
    /// Observations already present from an earlier run of the same snapshot.
    pub fn duplicates(&self) -> usize {
        self.observations.len() - self.ingested
    }
}

/// Pulls snapshots from a feed into the observation store.
#[derive(Debug)]
pub struct Importer {
    feed: Box<dyn ObservationFeed>,
    store: Arc<dyn ObservationStore>,
}

impl Importer {
    pub fn new(feed: Box<dyn ObservationFeed>, store: Arc<dyn ObservationStore>) -> Self {
        Self { feed, store }
    }

    /// Fetch one snapshot and ingest it.
    ///
    /// The snapshot is fully decoded before anything is written, so a failed
    /// cycle leaves the store exactly as it was.
    pub async fn run_import_cycle(&self) -> Result<ImportReport, FeedError> {
        let snapshot = match self.feed.fetch().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "Weather import failed, store left unchanged");
                return Err(err);
            }
        };

        let ingested = snapshot
            .observations
            .iter()
            .filter(|obs| self.store.ingest((*obs).clone()))
            .count();

        let report = ImportReport {
            timestamp: snapshot.timestamp,
            ingested,
            observations: snapshot.observations,
        };
        let observed_at = report.observations.first().and_then(Observation::observed_at);
        info!(
            timestamp = report.timestamp,
            observed_at = ?observed_at,
            ingested = report.ingested,
            duplicates = report.duplicates(),
            "Saved weather observations"
        );
        Ok(report)
    }
}
