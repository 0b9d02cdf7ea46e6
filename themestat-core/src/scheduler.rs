//! Periodic driver of refresh cycles.
//!
//! One cycle runs immediately, then one every `interval`. The interval is
//! measured from the end of the previous cycle, so a slow cycle pushes the
//! next one back rather than shortening the gap, and cycles never overlap.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::snapshot::SnapshotStore;

pub struct Scheduler {
    aggregator: Aggregator,
    store: SnapshotStore,
    interval: Duration,
}

impl Scheduler {
    pub fn new(aggregator: Aggregator, store: SnapshotStore, interval: Duration) -> Self {
        Self {
            aggregator,
            store,
            interval,
        }
    }

    /// Run one cycle and publish its snapshot. Returns whether it was published.
    ///
    /// On failure the previously published snapshot stays in place.
    pub async fn run_cycle(&self) -> bool {
        info!("Updating data...");
        match self.aggregator.refresh().await {
            Ok(snapshot) => {
                let keys = snapshot.len();
                self.store.publish(snapshot);
                info!("Data updated successfully ({} libraries)", keys);
                true
            }
            Err(e) => {
                error!("Error during update: {e}");
                false
            }
        }
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is checked between cycles; an in-flight cycle completes.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            self.run_cycle().await;

            info!("Scheduled next update in {} seconds", self.interval.as_secs());
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Spawn [`Scheduler::run`] onto the tokio runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
