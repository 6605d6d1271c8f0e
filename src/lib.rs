//! An insertion-ordered map that can flatten itself into two parallel
//! sequences of keys and values, for persistence layers that cannot natively
//! serialize associative maps.

mod error;
mod snapshot;
mod snapshot_map;
mod store;

#[cfg(feature = "shared_store")]
mod shared_store;

pub use crate::error::KeyNotFound;
pub use crate::snapshot::Snapshot;
pub use crate::snapshot_map::SnapshotMap;
pub use crate::store::Store;

#[cfg(feature = "shared_store")]
pub use crate::shared_store::SharedStore;
