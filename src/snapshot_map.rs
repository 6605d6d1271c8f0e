use std::{
    borrow::Borrow,
    collections::{hash_map::RandomState, HashMap},
    fmt,
    hash::{BuildHasher, Hash},
    iter::FromIterator,
    mem, ops,
};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::KeyNotFound;
use crate::snapshot::Snapshot;
use crate::store::Store;

/// A map that is two collections in a trenchcoat: a Vec of entries in
/// insertion order, which is the durable form, and a HashMap from key to
/// entry position for fast lookup. The flat pair form is what gets persisted
/// (through [`snapshot`]/[`restore`], or serde); the index is rebuilt on the
/// way in and never leaves memory.
///
/// Keys in the entry sequence are always pairwise distinct and the index
/// always agrees with the sequence; every operation maintains both together.
/// Restoring from a snapshot with duplicate keys keeps the first occurrence
/// and drops the rest, and sequences that disagree in length pair up to the
/// shorter one. Persisted data that went through an external editing surface
/// is allowed to be a mess; loading it must never fail.
///
/// Not synchronized: mutating one of these from several threads without
/// external locking is a data race. Wrap it in a
/// [`SharedStore`](crate::SharedStore) if you need that.
///
/// [`snapshot`]: SnapshotMap::snapshot
/// [`restore`]: SnapshotMap::restore
#[derive(Clone)]
pub struct SnapshotMap<K, V, S = RandomState>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Entries in insertion order. The durable representation.
    entries: Vec<(K, V)>,

    /// Key to position in `entries`. Derived, never persisted.
    index: HashMap<K, usize, S>,
}

impl<K, V> SnapshotMap<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    /// Makes a new, empty map.
    pub fn new() -> Self {
        SnapshotMap::with_capacity(0)
    }

    /// Makes a new map with room for a number of entries.
    pub fn with_capacity(capacity: usize) -> Self {
        SnapshotMap::with_capacity_and_hash_builder(capacity, Default::default())
    }

    /// Rebuilds a map from a persisted snapshot, with all of [`restore`]'s
    /// tolerance for malformed input.
    ///
    /// [`restore`]: SnapshotMap::restore
    pub fn from_snapshot(snapshot: Snapshot<K, V>) -> Self {
        let mut map = SnapshotMap::with_capacity(snapshot.len());
        map.restore(snapshot);
        map
    }
}

impl<K, V, S> SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Makes a new map with a specific capacity and hasher.
    pub fn with_capacity_and_hash_builder(capacity: usize, hash_builder: S) -> Self {
        SnapshotMap {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, hash_builder),
        }
    }

    /// Looks a value up by key.
    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(k) {
            Some(&position) => Some(&self.entries[position].1),
            None => None,
        }
    }

    /// Looks a mutable value up by key.
    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(k) {
            Some(&position) => Some(&mut self.entries[position].1),
            None => None,
        }
    }

    /// The failing lookup: like [`get`], except a missing key is an error
    /// rather than `None`. [`get`] exists precisely so callers can avoid this
    /// failure mode.
    ///
    /// [`get`]: SnapshotMap::get
    pub fn try_get<Q>(&self, k: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(k).ok_or(KeyNotFound)
    }

    /// Whether the map holds an entry for a key.
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(k)
    }

    /// Puts a value at a key, overwriting in place if the key already holds
    /// one. An overwrite keeps the entry's position, so the persisted order
    /// doesn't change. Returns the previous value at that key.
    pub fn set(&mut self, k: K, v: V) -> Option<V> {
        if let Some(&position) = self.index.get(&k) {
            Some(mem::replace(&mut self.entries[position].1, v))
        } else {
            self.push_entry(k, v);
            None
        }
    }

    /// Puts a value at a key only if the key holds none; an existing entry is
    /// left untouched, value included. [`set`] is the overwriting spelling.
    /// Returns whether an entry was inserted.
    ///
    /// [`set`]: SnapshotMap::set
    pub fn add(&mut self, k: K, v: V) -> bool {
        if self.index.contains_key(&k) {
            false
        } else {
            self.push_entry(k, v);
            true
        }
    }

    /// Removes a key, returning whatever was there. Later entries shift left
    /// to close the gap in the persisted order.
    pub fn remove<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(position) = self.index.remove(k) {
            let (_, v) = self.entries.remove(position);

            for p in self.index.values_mut() {
                if *p > position {
                    *p -= 1;
                }
            }

            Some(v)
        } else {
            None
        }
    }

    /// Clears the map entirely.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// The number of entries in the map right now.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Flattens the map into its persisted form: parallel key and value
    /// sequences in insertion order. This is the call to make right before
    /// handing the data to a persistence layer; serializing the map directly
    /// does the same thing.
    pub fn snapshot(&self) -> Snapshot<K, V>
    where
        V: Clone,
    {
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut values = Vec::with_capacity(self.entries.len());

        for (k, v) in &self.entries {
            keys.push(k.clone());
            values.push(v.clone());
        }

        Snapshot::new(keys, values)
    }

    /// Like [`snapshot`], but consumes the map so nothing is cloned.
    ///
    /// [`snapshot`]: SnapshotMap::snapshot
    pub fn into_snapshot(self) -> Snapshot<K, V> {
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut values = Vec::with_capacity(self.entries.len());

        for (k, v) in self.entries {
            keys.push(k);
            values.push(v);
        }

        Snapshot::new(keys, values)
    }

    /// Rebuilds the map from a persisted snapshot, replacing the current
    /// contents. This is the call to make right after deserializing the two
    /// sequences.
    ///
    /// Snapshots are repaired rather than rejected: positions pair up to the
    /// shorter of the two sequences, and when a key repeats, the first
    /// occurrence wins and the rest are dropped. Accepted entries keep their
    /// input order. A partially written or hand-edited snapshot must load
    /// without failing; whatever was dropped is visible at debug level.
    pub fn restore(&mut self, snapshot: Snapshot<K, V>) {
        self.entries.clear();
        self.index.clear();

        let (keys, values) = snapshot.into_parts();
        let total = keys.len().max(values.len());
        let paired = keys.len().min(values.len());

        for (k, v) in keys.into_iter().zip(values) {
            if self.index.contains_key(&k) {
                continue;
            }

            self.push_entry(k, v);
        }

        if self.entries.len() < total {
            log::debug!(
                "restored {} of {} snapshot entries ({} unpaired, {} duplicate keys dropped)",
                self.entries.len(),
                total,
                total - paired,
                paired - self.entries.len(),
            );
        }
    }

    /// Appends an entry known to be absent, keeping both representations in
    /// step.
    fn push_entry(&mut self, k: K, v: V) {
        self.index.insert(k.clone(), self.entries.len());
        self.entries.push((k, v));
    }
}

impl<K, V, S> Store<K, V> for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn set(&mut self, k: K, v: V) -> Option<V> {
        SnapshotMap::set(self, k, v)
    }

    fn add(&mut self, k: K, v: V) -> bool {
        SnapshotMap::add(self, k, v)
    }

    fn get<'a>(&'a self, k: &K) -> Option<&'a V> {
        SnapshotMap::get(self, k)
    }

    fn get_mut<'a>(&'a mut self, k: &K) -> Option<&'a mut V> {
        SnapshotMap::get_mut(self, k)
    }

    fn remove(&mut self, k: &K) -> Option<V> {
        SnapshotMap::remove(self, k)
    }

    fn clear(&mut self) {
        SnapshotMap::clear(self)
    }

    fn len(&self) -> usize {
        SnapshotMap::len(self)
    }
}

impl<K, V, S> Default for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        SnapshotMap::with_capacity_and_hash_builder(0, S::default())
    }
}

impl<K, V, S> fmt::Debug for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equality is over the ordered entry sequence: two maps holding the same
/// pairs in different insertion orders are not equal, since they persist
/// differently.
impl<K, V, S> PartialEq for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, V, S> Eq for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, Q, S> ops::Index<&Q> for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key has no entry. [`try_get`] is the fallible spelling.
    ///
    /// [`try_get`]: SnapshotMap::try_get
    fn index(&self, k: &Q) -> &V {
        self.get(k).expect("no entry found for key")
    }
}

impl<K, V, S> IntoIterator for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Item = &'a (K, V);
    type IntoIter = std::slice::Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Collects pairs in stream order through [`set`]: a repeated key overwrites,
/// last one wins. Only [`restore`] is first-wins.
///
/// [`set`]: SnapshotMap::set
/// [`restore`]: SnapshotMap::restore
impl<K, V> FromIterator<(K, V)> for SnapshotMap<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = SnapshotMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V> From<Snapshot<K, V>> for SnapshotMap<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    fn from(snapshot: Snapshot<K, V>) -> Self {
        SnapshotMap::from_snapshot(snapshot)
    }
}

impl<K, V, S> From<SnapshotMap<K, V, S>> for Snapshot<K, V>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn from(map: SnapshotMap<K, V, S>) -> Self {
        map.into_snapshot()
    }
}

/// Serializes as the snapshot form, `{"keys": [...], "values": [...]}`,
/// borrowing the entries rather than cloning them.
impl<K, V, S> Serialize for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone + Serialize,
    V: Serialize,
    S: BuildHasher,
{
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let keys: Vec<&K> = self.keys().collect();
        let values: Vec<&V> = self.values().collect();

        let mut s = serializer.serialize_struct("Snapshot", 2)?;
        s.serialize_field("keys", &keys)?;
        s.serialize_field("values", &values)?;
        s.end()
    }
}

/// Deserializes by reading a [`Snapshot`] and restoring from it, with all of
/// [`restore`]'s tolerance for duplicate keys, mismatched lengths, and absent
/// fields.
///
/// [`restore`]: SnapshotMap::restore
impl<'de, K, V, S> Deserialize<'de> for SnapshotMap<K, V, S>
where
    K: Eq + Hash + Clone + Deserialize<'de>,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let snapshot = Snapshot::deserialize(deserializer)?;
        let mut map = SnapshotMap::with_capacity_and_hash_builder(snapshot.len(), S::default());
        map.restore(snapshot);
        Ok(map)
    }
}
