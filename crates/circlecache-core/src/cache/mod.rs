//! In-memory snapshot of all circles and members.
//!
//! `SnapshotStore` holds the latest data behind an atomic pointer swap.
//! Nothing is written to disk; the snapshot lives for the process lifetime.

pub mod store;

pub use store::{Snapshot, SnapshotStore};
