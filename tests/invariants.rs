use std::collections::HashSet;

use proptest::prelude::*;
use snapshot_map::{Snapshot, SnapshotMap};

/// The number of operations to replay in each proptest case.
const OPS: usize = 200;

fn key_strategy() -> impl Strategy<Value = u8> {
    // a small key space so operations collide often
    0u8..16
}

fn value_strategy() -> impl Strategy<Value = i32> {
    any::<i32>()
}

#[derive(Debug, Clone)]
enum MapOp {
    Add(u8, i32),
    Set(u8, i32),
    Remove(u8),
    Roundtrip,
    Clear,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Add(k, v)),
        4 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Set(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        1 => Just(MapOp::Roundtrip),
        1 => Just(MapOp::Clear),
    ]
}

/// The reference implementation: an association list with the same ordered
/// semantics, too slow to ship and simple enough to be obviously right.
#[derive(Default)]
struct ModelMap {
    entries: Vec<(u8, i32)>,
}

impl ModelMap {
    fn position(&self, k: u8) -> Option<usize> {
        self.entries.iter().position(|&(ek, _)| ek == k)
    }

    fn add(&mut self, k: u8, v: i32) {
        if self.position(k).is_none() {
            self.entries.push((k, v));
        }
    }

    fn set(&mut self, k: u8, v: i32) {
        match self.position(k) {
            Some(i) => self.entries[i].1 = v,
            None => self.entries.push((k, v)),
        }
    }

    fn remove(&mut self, k: u8) -> Option<i32> {
        self.position(k).map(|i| self.entries.remove(i).1)
    }
}

/// Checks that the map matches the model and that its two representations
/// agree with each other: the ordered entries hold pairwise-distinct keys,
/// and lookups reach exactly the entries that iteration yields.
fn assert_agrees(map: &SnapshotMap<u8, i32>, model: &ModelMap) {
    let pairs: Vec<(u8, i32)> = map.iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(model.entries, pairs);

    let distinct: HashSet<u8> = pairs.iter().map(|&(k, _)| k).collect();
    assert_eq!(pairs.len(), distinct.len());

    assert_eq!(model.entries.len(), map.len());
    for &(k, v) in &model.entries {
        assert_eq!(Some(&v), map.get(&k));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replays a random op sequence against the naive ordered model and
    /// checks that both representations stay consistent after every step.
    #[test]
    fn random_ops_preserve_both_representations(
        ops in proptest::collection::vec(map_op_strategy(), OPS),
    ) {
        let mut map: SnapshotMap<u8, i32> = SnapshotMap::new();
        let mut model = ModelMap::default();

        for op in ops {
            match op {
                MapOp::Add(k, v) => {
                    map.add(k, v);
                    model.add(k, v);
                }
                MapOp::Set(k, v) => {
                    map.set(k, v);
                    model.set(k, v);
                }
                MapOp::Remove(k) => {
                    assert_eq!(model.remove(k), map.remove(&k));
                }
                MapOp::Roundtrip => {
                    map = SnapshotMap::from_snapshot(map.snapshot());
                }
                MapOp::Clear => {
                    map.clear();
                    model.entries.clear();
                }
            }

            assert_agrees(&map, &model);
        }
    }

    /// A snapshot with arbitrary garbage in it (duplicate keys, mismatched
    /// lengths) always restores to a map holding the first occurrence of each
    /// paired key, in input order.
    #[test]
    fn any_snapshot_restores_without_failing(
        keys in proptest::collection::vec(key_strategy(), 0..32),
        values in proptest::collection::vec(value_strategy(), 0..32),
    ) {
        let map = SnapshotMap::from_snapshot(Snapshot::new(keys.clone(), values.clone()));

        let mut expected: Vec<(u8, i32)> = Vec::new();
        for (&k, &v) in keys.iter().zip(values.iter()) {
            if !expected.iter().any(|&(ek, _)| ek == k) {
                expected.push((k, v));
            }
        }

        let pairs: Vec<(u8, i32)> = map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(expected, pairs);
    }

    /// Writing a map out through JSON and reading it back reproduces it
    /// exactly, entry order included.
    #[test]
    fn json_round_trip(
        pairs in proptest::collection::vec((key_strategy(), value_strategy()), 0..32),
    ) {
        let map: SnapshotMap<u8, i32> = pairs.into_iter().collect();

        let json = serde_json::to_string(&map).unwrap();
        let loaded: SnapshotMap<u8, i32> = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(map, loaded);
    }
}
