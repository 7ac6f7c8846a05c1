// Resumable per-puzzle progress

pub mod snapshot;
pub mod store;

pub use snapshot::{ProgressSnapshot, SnapshotError};
pub use store::{
    load_snapshot, save_snapshot, FileProgressStore, MemoryProgressStore, ProgressKey, ProgressStore,
};
