use thiserror::Error;

/// The failing lookup's error: the requested key has no entry.
///
/// Only [`SnapshotMap::try_get`] returns this. Every other operation is
/// total; in particular a malformed snapshot is repaired on restore, never
/// reported.
///
/// [`SnapshotMap::try_get`]: crate::SnapshotMap::try_get
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("key not found")]
pub struct KeyNotFound;
