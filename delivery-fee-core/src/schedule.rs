use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{error, info, warn};

use crate::importer::Importer;

/// How often the importer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSchedule {
    pub interval: Duration,
    /// Run a cycle immediately instead of waiting one interval.
    pub run_on_start: bool,
}

impl Default for ImportSchedule {
    fn default() -> Self {
        Self { interval: Duration::from_secs(3600), run_on_start: true }
    }
}

/// Background task that runs import cycles on a fixed interval.
///
/// A failed cycle is logged and the next tick proceeds as usual.
#[derive(Debug)]
pub struct ImportTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ImportTask {
    /// Spawn the task on the current tokio runtime.
    pub fn spawn(importer: Arc<Importer>, schedule: ImportSchedule) -> Self {
        let (shutdown, signal) = watch::channel(false);
        let handle = tokio::spawn(run(importer, schedule, signal));
        Self { shutdown, handle }
    }

    /// Signal the task to stop and wait for an in-flight cycle to finish.
    pub async fn stop(self) {
        // The receiver is gone only if the task already exited.
        if self.shutdown.send(true).is_err() {
            warn!("Import task already stopped");
        }
        if let Err(err) = self.handle.await {
            error!(error = %err, "Import task terminated abnormally");
        }
    }
}

async fn run(importer: Arc<Importer>, schedule: ImportSchedule, mut shutdown: watch::Receiver<bool>) {
    let first = if schedule.run_on_start { Instant::now() } else { Instant::now() + schedule.interval };
    let mut ticker = time::interval_at(first, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = schedule.interval.as_secs(), "Weather import scheduled");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                info!("Weather import triggered");
                // Errors are already logged by the importer.
                if importer.run_import_cycle().await.is_err() {
                    warn!("Skipping failed import cycle until next tick");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Weather import stopped");
}
