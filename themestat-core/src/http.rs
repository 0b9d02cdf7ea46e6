//! Read-only HTTP surface over the [`SnapshotStore`].

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::snapshot::{Snapshot, SnapshotStore};

pub fn create_router(store: SnapshotStore) -> Router {
    Router::new()
        .route("/", get(current_snapshot))
        .route("/health", get(health))
        .with_state(store)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    libraries: usize,
    refreshed_at: Option<DateTime<Utc>>,
}

/// The latest snapshot as a flat `{"combined_value_<library>": "themed/total"}` object.
async fn current_snapshot(State(store): State<SnapshotStore>) -> Json<Snapshot> {
    debug!("Received GET request for /");
    Json(Snapshot::clone(&store.read()))
}

async fn health(State(store): State<SnapshotStore>) -> Json<Health> {
    let snapshot = store.read();
    Json(Health {
        status: "ok",
        libraries: snapshot.len(),
        refreshed_at: snapshot.refreshed_at(),
    })
}
