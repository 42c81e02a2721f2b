//! A hash map with a fixed number of buckets, agnostic to how each bucket
//! stores its entries.

use std::{
    collections::hash_map::RandomState,
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    marker::PhantomData,
};

use tracing::debug;

use crate::bucket::{Bucket, BucketFactory};
use crate::entry::{combine_digests, Entry};
use crate::error::{Error, Result};
use crate::map::Map;

/// Bucket count used by [`BucketMap::new`].
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

type KeyHash = u64;

/// Routes every key to exactly one of a fixed set of buckets by its hash, and
/// lets the buckets (built by the factory `F`) decide how to hold the entries
/// that collide. There is no resizing: the bucket count chosen at
/// construction is kept for the life of the map.
///
/// Equality and hashing look only at the stored pairs, so two maps with the
/// same contents agree regardless of bucket kind, bucket count, hasher or
/// insertion order.
pub struct BucketMap<K, V, F, S = RandomState>
where
    F: BucketFactory<K, V>,
{
    buckets: Vec<F::Bucket>,

    /// Total number of keys across all buckets.
    size: usize,

    factory: F,
    hash_builder: S,
    kvpd: PhantomData<(K, V)>,
}

impl<K, V, F> BucketMap<K, V, F, RandomState>
where
    K: Eq + Hash,
    F: BucketFactory<K, V>,
{
    /// Makes a map with [`DEFAULT_BUCKET_COUNT`] buckets.
    pub fn new(factory: F) -> Self {
        Self::build(factory, DEFAULT_BUCKET_COUNT, RandomState::new())
    }

    /// Makes a map with a specified, strictly positive, number of buckets.
    pub fn with_bucket_count(factory: F, bucket_count: usize) -> Result<Self> {
        Self::with_bucket_count_and_hash_builder(
            factory,
            bucket_count,
            RandomState::new(),
        )
    }
}

impl<K, V, F, S> BucketMap<K, V, F, S>
where
    K: Eq + Hash,
    F: BucketFactory<K, V>,
    S: BuildHasher,
{
    /// Makes a map with a specified number of buckets and hasher.
    pub fn with_bucket_count_and_hash_builder(
        factory: F,
        bucket_count: usize,
        hash_builder: S,
    ) -> Result<Self> {
        if bucket_count == 0 {
            return Err(Error::InvalidArgument(
                "a map needs at least one bucket",
            ));
        }

        Ok(Self::build(factory, bucket_count, hash_builder))
    }

    fn build(factory: F, bucket_count: usize, hash_builder: S) -> Self {
        debug!(
            bucket_count,
            backing_store = factory.backing_store(),
            "creating bucket map"
        );

        BucketMap {
            buckets: factory.create_buckets(bucket_count),
            size: 0,
            factory,
            hash_builder,
            kvpd: PhantomData,
        }
    }

    fn hash_k(&self, k: &K) -> KeyHash {
        let mut h = self.hash_builder.build_hasher();
        k.hash(&mut h);
        h.finish()
    }

    /// The bucket a key routes to. Pure for a given hasher and bucket count.
    pub fn bucket_index(&self, k: &K) -> usize {
        // hashes are unsigned, so every value has a well-defined remainder
        (self.hash_k(k) % self.buckets.len() as KeyHash) as usize
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket(&self, index: usize) -> Option<&F::Bucket> {
        self.buckets.get(index)
    }

    pub fn buckets(&self) -> &[F::Bucket] {
        &self.buckets
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    fn bucket_for(&self, k: &K) -> &F::Bucket {
        &self.buckets[self.bucket_index(k)]
    }

    fn bucket_for_mut(&mut self, k: &K) -> &mut F::Bucket {
        let index = self.bucket_index(k);
        &mut self.buckets[index]
    }

    /// The number of keys in the map.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Stores `v` under `k`, returning the value it displaced.
    pub fn put(&mut self, k: K, v: V) -> Option<V> {
        let displaced = self.bucket_for_mut(&k).put(k, v);
        if displaced.is_none() {
            self.size += 1;
        }
        displaced
    }

    pub fn get(&self, k: &K) -> Option<&V> {
        self.bucket_for(k).get(k).ok()
    }

    pub fn get_mut(&mut self, k: &K) -> Option<&mut V> {
        self.bucket_for_mut(k).get_mut(k).ok()
    }

    pub fn get_entry(&self, k: &K) -> Option<&Entry<K, V>> {
        self.bucket_for(k).get_entry(k)
    }

    /// Removes `k`, returning its value. Nothing changes if it is absent.
    pub fn remove(&mut self, k: &K) -> Option<V> {
        let removed = self.bucket_for_mut(k).remove(k).ok()?;
        self.size -= 1;
        Some(removed.into_pair().1)
    }

    /// Overwrites the value of a key already in the map, returning the old
    /// value. Absent keys stay absent and the size never changes.
    pub fn replace(&mut self, k: &K, v: V) -> Option<V> {
        self.bucket_for_mut(k).replace(k, v).ok()
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.bucket_for(k).contains_key(k)
    }

    pub fn contains_pair(&self, k: &K, v: &V) -> bool
    where
        V: PartialEq,
    {
        self.bucket_for(k).contains_pair(k, v)
    }

    /// Scans every bucket for a value.
    pub fn contains_value(&self, v: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|held| held == v)
    }

    /// Empties every bucket. The bucket count is kept.
    pub fn clear(&mut self) {
        debug!(size = self.size, "clearing bucket map");
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.size = 0;
    }

    /// Every pair in the map, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.entries())
            .map(|entry| (entry.key(), entry.value()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Every pair with its value open for writing, in no particular order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> + '_ {
        self.buckets
            .iter_mut()
            .flat_map(|bucket| bucket.entries_mut())
            .map(Entry::pair_mut)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Keeps only the pairs for which `keep` answers true. `keep` sees every
    /// pair once and may edit the values it keeps.
    pub fn retain<P>(&mut self, mut keep: P)
    where
        P: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        for bucket in &mut self.buckets {
            removed += bucket.retain(&mut keep);
        }
        self.size -= removed;
        debug!(removed, size = self.size, "retained bucket map entries");
    }

    /// True when `other` holds exactly the same pairs. Equal sizes plus every
    /// pair of ours being in `other` is enough, since keys are unique.
    pub fn equals<M>(&self, other: &M) -> bool
    where
        M: Map<K, V>,
        V: PartialEq,
    {
        self.size == other.len()
            && self
                .iter()
                .all(|(k, v)| other.contains_pair(k, v))
    }

    /// A hash of the stored pairs alone, independent of bucket layout and
    /// insertion order.
    pub fn hash_code(&self) -> u64
    where
        V: Hash,
    {
        let mut digests = Vec::with_capacity(self.size);
        for bucket in &self.buckets {
            digests.extend(bucket.entry_digests());
        }
        combine_digests(digests)
    }
}

impl<K, V, F, S> Map<K, V> for BucketMap<K, V, F, S>
where
    K: Eq + Hash,
    F: BucketFactory<K, V>,
    S: BuildHasher,
{
    fn put(&mut self, k: K, v: V) -> Option<V> {
        BucketMap::put(self, k, v)
    }

    fn get(&self, k: &K) -> Option<&V> {
        BucketMap::get(self, k)
    }

    fn remove(&mut self, k: &K) -> Option<V> {
        BucketMap::remove(self, k)
    }

    fn replace(&mut self, k: &K, v: V) -> Option<V> {
        BucketMap::replace(self, k, v)
    }

    fn contains_key(&self, k: &K) -> bool {
        BucketMap::contains_key(self, k)
    }

    fn contains_pair(&self, k: &K, v: &V) -> bool
    where
        V: PartialEq,
    {
        BucketMap::contains_pair(self, k, v)
    }

    fn clear(&mut self) {
        BucketMap::clear(self)
    }

    fn len(&self) -> usize {
        self.size
    }
}

impl<K, V, F, S, F2, S2> PartialEq<BucketMap<K, V, F2, S2>>
    for BucketMap<K, V, F, S>
where
    K: Eq + Hash,
    V: PartialEq,
    F: BucketFactory<K, V>,
    F2: BucketFactory<K, V>,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &BucketMap<K, V, F2, S2>) -> bool {
        self.equals(other)
    }
}

impl<K, V, F, S> Eq for BucketMap<K, V, F, S>
where
    K: Eq + Hash,
    V: Eq,
    F: BucketFactory<K, V>,
    S: BuildHasher,
{
}

impl<K, V, F, S> Hash for BucketMap<K, V, F, S>
where
    K: Eq + Hash,
    V: Hash,
    F: BucketFactory<K, V>,
    S: BuildHasher,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K, V, F, S> Extend<(K, V)> for BucketMap<K, V, F, S>
where
    K: Eq + Hash,
    F: BucketFactory<K, V>,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, F, S> Clone for BucketMap<K, V, F, S>
where
    F: BucketFactory<K, V> + Clone,
    F::Bucket: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        BucketMap {
            buckets: self.buckets.clone(),
            size: self.size,
            factory: self.factory.clone(),
            hash_builder: self.hash_builder.clone(),
            kvpd: PhantomData,
        }
    }
}

impl<K, V, F, S> fmt::Debug for BucketMap<K, V, F, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    F: BucketFactory<K, V>,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Dumps every bucket in index order, for diagnostics only.
impl<K, V, F, S> fmt::Display for BucketMap<K, V, F, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
    F: BucketFactory<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketMap{{ size={}, buckets=", self.size)?;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "bucket[{}]{{", i)?;
            bucket.describe(f)?;
            f.write_str("}")?;
        }
        f.write_str(" }")
    }
}
