//! The flat, persistence-ready form of a map: two parallel sequences of keys
//! and values, positionally paired.

use serde::{Deserialize, Serialize};

/// A map flattened into two parallel sequences, suitable for handing to a
/// serializer that cannot express associative maps. Position `i` of the key
/// sequence pairs with position `i` of the value sequence.
///
/// A snapshot makes no promises about its own shape: the sequences may differ
/// in length and keys may repeat, since the data may come back from an
/// external editing surface in any state. [`SnapshotMap::restore`] resolves
/// both without erroring.
///
/// [`SnapshotMap::restore`]: crate::SnapshotMap::restore
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K, V> Snapshot<K, V> {
    /// Pairs up two raw sequences. No validation happens here; mismatched
    /// lengths and duplicate keys are legal inputs.
    pub fn new(keys: Vec<K>, values: Vec<V>) -> Self {
        Self { keys, values }
    }

    /// The key sequence, in persisted order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// The value sequence, in persisted order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// The number of positionally paired entries. An unpaired tail left by
    /// sequences of different lengths doesn't count.
    pub fn len(&self) -> usize {
        self.keys.len().min(self.values.len())
    }

    /// Whether the snapshot holds no paired entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits the snapshot back into its raw sequences.
    pub fn into_parts(self) -> (Vec<K>, Vec<V>) {
        (self.keys, self.values)
    }
}

impl<K, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }
}
