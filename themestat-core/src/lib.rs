//! Theme coverage for a remote media library server.
//!
//! A background [`scheduler::Scheduler`] periodically asks the server for its
//! libraries, counts how many entries in each carry a theme, and publishes the
//! result into a [`snapshot::SnapshotStore`]. The [`http`] router serves the
//! latest published snapshot to pollers.

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod coverage;
pub mod http;
pub mod scheduler;
pub mod snapshot;
