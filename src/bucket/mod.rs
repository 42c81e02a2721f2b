pub mod factory;
pub mod list_bucket;
pub mod tree_bucket;

pub use factory::{AnyBucket, BasicBucketFactory, BucketFactory, BucketKind};
pub use list_bucket::ListBucket;
pub use tree_bucket::TreeBucket;

use std::{fmt, hash::Hash};

use crate::entry::Entry;
use crate::error::Result;

// A bucket only ever sees the keys that route to it, so none of these
// operations hash anything. Implementations differ in how they keep entries
// (chain or tree), which is all the routing layer is allowed to vary.

/// One slot of a [`BucketMap`](crate::BucketMap), owning zero or one backing
/// store root.
pub trait Bucket<K, V> {
    /// Stores the pair, overwriting the value if the key is already held.
    /// Returns the displaced value, so `None` means a new entry was added.
    fn put(&mut self, key: K, value: V) -> Option<V>;

    /// Overwrites the value under an existing key, returning the old one.
    fn replace(&mut self, key: &K, value: V) -> Result<V>;

    fn get(&self, key: &K) -> Result<&V>;

    fn get_mut(&mut self, key: &K) -> Result<&mut V>;

    fn get_entry(&self, key: &K) -> Option<&Entry<K, V>>;

    /// Takes the entry under `key` out of the bucket. The bucket is left as
    /// it was when this fails.
    fn remove(&mut self, key: &K) -> Result<Entry<K, V>>;

    fn contains_key(&self, key: &K) -> bool {
        self.get_entry(key).is_some()
    }

    /// True only when `key` is held and mapped to exactly `value`.
    fn contains_pair(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.get_entry(key).is_some_and(|entry| entry.value() == value)
    }

    /// Every entry in the bucket. The order is whatever the backing store
    /// keeps, stable for an unchanged bucket.
    fn entries(&self) -> Vec<&Entry<K, V>>;

    /// Every entry, with its value open for writing. Same order as
    /// [`entries`](Bucket::entries).
    fn entries_mut(&mut self) -> Vec<&mut Entry<K, V>>;

    /// Drops every entry for which `keep` answers false, returning how many
    /// went. `keep` may also edit the values it is shown.
    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool;

    fn entry_digests(&self) -> Vec<u64>
    where
        K: Hash,
        V: Hash,
    {
        self.entries().into_iter().map(Entry::digest).collect()
    }

    /// Writes the bucket's entries for diagnostics.
    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        for (i, entry) in self.entries().into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the backing store in one go.
    fn clear(&mut self);
}
