use parking_lot::RwLock;
use std::{hash::Hash, marker::PhantomData, sync::Arc};

use crate::store::Store;

/// Wrapper for a store which is shareable across thread boundaries.
///
/// The store types in this crate aren't synchronized on their own; this is
/// the supported way to mutate one from several threads.
pub struct SharedStore<S, K, V>(
    Arc<RwLock<S>>,
    PhantomData<K>,
    PhantomData<V>,
)
where
    S: Store<K, V>,
    K: Eq + Hash,
    V: Clone;

impl<S, K, V> SharedStore<S, K, V>
where
    S: Store<K, V>,
    K: Eq + Hash,
    V: Clone,
{
    /// Wraps a store into a shared store accessor, making it safe to move
    /// across thread boundaries. Enforces an additional constraint of Clone
    /// on values.
    pub fn with_store(store: S) -> Self {
        Self(Arc::from(RwLock::from(store)), PhantomData, PhantomData)
    }

    /// Sets a value, overwriting in place if the key already holds one.
    pub fn set(&self, k: K, v: V) -> Option<V> {
        self.0.write().set(k, v)
    }

    /// Adds a value only if the key holds none.
    pub fn add(&self, k: K, v: V) -> bool {
        self.0.write().add(k, v)
    }

    /// Gets an item from the store. This clones it to minimize the lock time
    /// of the store.
    pub fn get(&self, k: &K) -> Option<V> {
        self.0.read().get(k).map(|v| v.clone())
    }

    /// Removes an item from the store, returning the removed item if it
    /// existed.
    pub fn remove(&self, k: &K) -> Option<V> {
        self.0.write().remove(k)
    }

    /// Clears the store.
    pub fn clear(&self) {
        self.0.write().clear()
    }

    /// The number of elements in the store at present.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the store holds no elements at present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S, K, V> Clone for SharedStore<S, K, V>
where
    S: Store<K, V>,
    K: Eq + Hash,
    V: Clone,
{
    fn clone(&self) -> Self {
        SharedStore(self.0.clone(), PhantomData, PhantomData)
    }
}
