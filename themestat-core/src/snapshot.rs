//! Published coverage snapshots.
//!
//! A [`Snapshot`] is built in full by one refresh cycle and then swapped into
//! the [`SnapshotStore`] as a single pointer store. Readers hold an
//! `Arc<Snapshot>` and never see a partially built map.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::coverage::Coverage;

/// Prefix of every key in a published snapshot.
pub const KEY_PREFIX: &str = "combined_value_";

/// Key under which a library's coverage is published.
pub fn coverage_key(library_title: &str) -> String {
    format!("{KEY_PREFIX}{}", library_title.to_lowercase())
}

/// The result of one completed refresh cycle.
///
/// Serializes as the flat `key -> "themed/total"` object served to readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
    #[serde(skip)]
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Record `coverage` for the library titled `library_title`, replacing any
    /// earlier library whose title lowercases to the same key.
    pub fn insert(&mut self, library_title: &str, coverage: Coverage) {
        self.entries
            .insert(coverage_key(library_title), coverage.to_string());
    }

    /// Stamp the snapshot with its completion time.
    pub fn completed(mut self, at: DateTime<Utc>) -> Self {
        self.refreshed_at = Some(at);
        self
    }

    /// Flat `key -> "themed/total"` mapping, as served to readers.
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When this snapshot was completed. `None` for the initial empty snapshot.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Holder of the most recently published [`Snapshot`].
///
/// Cloning yields another handle onto the same store.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    current: Arc<ArcSwap<Snapshot>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// A store holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::default())),
        }
    }

    /// Replace the current snapshot wholesale.
    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }

    /// The current snapshot. Never waits on a concurrent `publish`.
    pub fn read(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }
}
