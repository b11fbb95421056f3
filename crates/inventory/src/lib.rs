//! LCA engine implementations for dopo.

pub mod in_memory;
pub mod model;
pub mod snapshot;

pub use in_memory::InMemoryEngine;
pub use model::{DatabaseData, Inventory, ProjectData, StoredBreakdown};
pub use snapshot::SnapshotEngine;
