use std::{
    collections::HashMap,
    hash::{BuildHasher, Hash},
    mem,
};

/// Describes what a map is. Comparing two maps only needs `len` and
/// `contains_pair`, so anything implementing this can be compared against a
/// [`BucketMap`](crate::BucketMap).
pub trait Map<K, V> {
    /// Stores a value under a key. Returns the previous value if the key
    /// already had one.
    fn put(&mut self, k: K, v: V) -> Option<V>;

    fn get(&self, k: &K) -> Option<&V>;

    /// Removes a key, returning whatever was there.
    fn remove(&mut self, k: &K) -> Option<V>;

    /// Overwrites the value of a key that is already present, returning the
    /// old value. Absent keys are left absent.
    fn replace(&mut self, k: &K, v: V) -> Option<V>;

    fn contains_key(&self, k: &K) -> bool;

    /// True only when `k` is present and mapped to exactly `v`.
    fn contains_pair(&self, k: &K, v: &V) -> bool
    where
        V: PartialEq,
    {
        self.get(k).is_some_and(|held| held == v)
    }

    /// Clears the map entirely.
    fn clear(&mut self);

    /// The number of keys stored right now.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, S> Map<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn put(&mut self, k: K, v: V) -> Option<V> {
        self.insert(k, v)
    }

    fn get(&self, k: &K) -> Option<&V> {
        HashMap::get(self, k)
    }

    fn remove(&mut self, k: &K) -> Option<V> {
        HashMap::remove(self, k)
    }

    fn replace(&mut self, k: &K, v: V) -> Option<V> {
        self.get_mut(k).map(|held| mem::replace(held, v))
    }

    fn contains_key(&self, k: &K) -> bool {
        HashMap::contains_key(self, k)
    }

    fn clear(&mut self) {
        HashMap::clear(self)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}
