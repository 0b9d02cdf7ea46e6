//! One refresh cycle: list libraries, count each one's themes, build a snapshot.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogError, CatalogSource};
use crate::coverage::{self, ParseError};
use crate::snapshot::Snapshot;

/// Why a whole refresh cycle was abandoned.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to fetch library sections: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to parse library sections: {0}")]
    Parse(#[from] ParseError),
}

/// Runs one full refresh cycle against a [`CatalogSource`].
pub struct Aggregator {
    source: Arc<dyn CatalogSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// Build a fresh snapshot of every library's theme coverage.
    ///
    /// A failure to fetch or parse the library listing aborts the cycle. A
    /// failure to fetch one library's items only drops that library.
    pub async fn refresh(&self) -> Result<Snapshot, RefreshError> {
        let listing = self.source.list_libraries().await?;
        let libraries = coverage::parse_libraries(&listing)?;

        let mut snapshot = Snapshot::default();
        for library in &libraries {
            let items = match self.source.list_items(&library.key).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(
                        "Skipping library key {} ({}) due to fetch failure: {e}",
                        library.key, library.title
                    );
                    continue;
                }
            };

            let coverage = coverage::count(&items);
            info!("Library '{}': {} themed", library.title, coverage);
            snapshot.insert(&library.title, coverage);
        }

        info!(
            "Refreshed {}/{} libraries",
            snapshot.len(),
            libraries.len()
        );
        Ok(snapshot.completed(Utc::now()))
    }
}
