use parking_lot::RwLock;
use std::{marker::PhantomData, sync::Arc};

use crate::map::Map;

/// Wrapper for a map which is shareable across thread boundaries. None of a
/// map's operations are built for interleaving, so the whole map sits behind
/// one lock; readers share it, anything that mutates takes it exclusively.
pub struct SharedMap<M, K, V>(
    Arc<RwLock<M>>,
    PhantomData<K>,
    PhantomData<V>,
)
where
    M: Map<K, V>,
    V: Clone;

impl<M, K, V> SharedMap<M, K, V>
where
    M: Map<K, V>,
    V: Clone,
{
    /// Wraps a map into a shared map accessor, making it safe to move across
    /// thread boundaries. Enforces an additional constraint of Clone on
    /// values.
    pub fn with_map(map: M) -> Self {
        Self(Arc::from(RwLock::from(map)), PhantomData, PhantomData)
    }

    /// Stores a value, returning the one it displaced.
    pub fn put(&self, k: K, v: V) -> Option<V> {
        self.0.write().put(k, v)
    }

    /// Get a value from the map. This clones it to minimize the lock time of
    /// the map.
    pub fn get(&self, k: &K) -> Option<V> {
        self.0.read().get(k).cloned()
    }

    /// Remove a key from the map, returning its value if it existed.
    pub fn remove(&self, k: &K) -> Option<V> {
        self.0.write().remove(k)
    }

    /// Overwrites the value of a key that is already present.
    pub fn replace(&self, k: &K, v: V) -> Option<V> {
        self.0.write().replace(k, v)
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.0.read().contains_key(k)
    }

    /// Clears the map.
    pub fn clear(&self) {
        self.0.write().clear()
    }

    /// The number of keys in the map at present.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Runs `f` with shared access to the wrapped map.
    pub fn read<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&*self.0.read())
    }

    /// Runs `f` with exclusive access to the wrapped map.
    pub fn write<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut *self.0.write())
    }
}

impl<M, K, V> Clone for SharedMap<M, K, V>
where
    M: Map<K, V>,
    V: Clone,
{
    fn clone(&self) -> Self {
        SharedMap(self.0.clone(), PhantomData, PhantomData)
    }
}
