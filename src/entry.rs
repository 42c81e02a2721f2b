//! The key-value pair stored by every backing store, and the order-independent
//! digests that let differently-shaped stores agree on a hash.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    mem,
};

/// A key with its value. The key never changes once the entry exists; the
/// value may be overwritten in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The key alongside mutable access to the value.
    pub fn pair_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    /// Overwrites the value, handing back the one it displaced.
    pub fn set_value(&mut self, value: V) -> V {
        mem::replace(&mut self.value, value)
    }

    pub fn has_key(&self, key: &K) -> bool
    where
        K: PartialEq,
    {
        self.key == *key
    }

    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Hash of this entry that depends only on its key and value. Stable
    /// across maps, hashers and processes built from the same toolchain.
    pub fn digest(&self) -> u64
    where
        K: Hash,
        V: Hash,
    {
        fingerprint(&self.key) ^ fingerprint(&self.value)
    }
}

impl<K, V> Hash for Entry<K, V>
where
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest());
    }
}

impl<K, V> fmt::Display for Entry<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{key={:?}, value={:?}}}", self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Entry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Hashes a single value with fixed keys, so the result does not depend on
/// any map's `BuildHasher`.
fn fingerprint<T: Hash + ?Sized>(t: &T) -> u64 {
    let mut h = DefaultHasher::new();
    t.hash(&mut h);
    h.finish()
}

/// Folds a multiset of entry digests into one value. Sorting first makes the
/// result independent of the order the digests were gathered in.
pub(crate) fn combine_digests(mut digests: Vec<u64>) -> u64 {
    digests.sort_unstable();
    let mut h = DefaultHasher::new();
    digests.hash(&mut h);
    h.finish()
}
