//! Selecting which backing store a map's buckets use.

use std::{any::type_name, fmt};

use super::{Bucket, ListBucket, TreeBucket};
use crate::entry::Entry;
use crate::error::Result;
use crate::order::{NaturalOrder, OrderOracle};

/// Produces empty buckets for a [`BucketMap`](crate::BucketMap). This is the
/// only thing a map knows about its buckets' implementation, and the place to
/// plug in new backing stores.
pub trait BucketFactory<K, V> {
    type Bucket: Bucket<K, V>;

    fn create_bucket(&self) -> Self::Bucket;

    fn create_buckets(&self, count: usize) -> Vec<Self::Bucket> {
        (0..count).map(|_| self.create_bucket()).collect()
    }

    /// Names the backing store this factory builds, for diagnostics.
    fn backing_store(&self) -> &'static str {
        type_name::<Self::Bucket>()
    }
}

/// The backing stores [`BasicBucketFactory`] knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketKind {
    /// Singly linked chain.
    List,

    /// AVL tree.
    AvlTree,
}

impl BucketKind {
    pub fn name(self) -> &'static str {
        match self {
            BucketKind::List => "list",
            BucketKind::AvlTree => "avl_tree",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds [`AnyBucket`]s of one configured kind. Tree buckets each get a
/// clone of the factory's order oracle.
#[derive(Clone, Debug)]
pub struct BasicBucketFactory<O = NaturalOrder> {
    kind: BucketKind,
    oracle: O,
}

impl BasicBucketFactory<NaturalOrder> {
    /// A factory whose tree buckets order keys by `Ord`.
    pub fn new(kind: BucketKind) -> Self {
        Self::with_oracle(kind, NaturalOrder)
    }
}

impl<O> BasicBucketFactory<O> {
    pub fn with_oracle(kind: BucketKind, oracle: O) -> Self {
        Self { kind, oracle }
    }

    pub fn kind(&self) -> BucketKind {
        self.kind
    }
}

impl<K, V, O> BucketFactory<K, V> for BasicBucketFactory<O>
where
    K: PartialEq,
    O: OrderOracle<K> + Clone,
{
    type Bucket = AnyBucket<K, V, O>;

    fn backing_store(&self) -> &'static str {
        self.kind.name()
    }

    fn create_bucket(&self) -> Self::Bucket {
        match self.kind {
            BucketKind::List => AnyBucket::List(ListBucket::new()),
            BucketKind::AvlTree => {
                AnyBucket::Tree(TreeBucket::with_oracle(self.oracle.clone()))
            }
        }
    }
}

/// Either kind of bucket behind one type, so a factory can pick the backing
/// store at run time.
#[derive(Clone, Debug)]
pub enum AnyBucket<K, V, O = NaturalOrder> {
    List(ListBucket<K, V>),
    Tree(TreeBucket<K, V, O>),
}

impl<K, V, O> AnyBucket<K, V, O> {
    pub fn kind(&self) -> BucketKind {
        match self {
            AnyBucket::List(_) => BucketKind::List,
            AnyBucket::Tree(_) => BucketKind::AvlTree,
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $bucket:ident => $body:expr) => {
        match $self {
            AnyBucket::List($bucket) => $body,
            AnyBucket::Tree($bucket) => $body,
        }
    };
}

impl<K, V, O> Bucket<K, V> for AnyBucket<K, V, O>
where
    K: PartialEq,
    O: OrderOracle<K>,
{
    fn put(&mut self, key: K, value: V) -> Option<V> {
        dispatch!(self, b => b.put(key, value))
    }

    fn replace(&mut self, key: &K, value: V) -> Result<V> {
        dispatch!(self, b => b.replace(key, value))
    }

    fn get(&self, key: &K) -> Result<&V> {
        dispatch!(self, b => b.get(key))
    }

    fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        dispatch!(self, b => b.get_mut(key))
    }

    fn get_entry(&self, key: &K) -> Option<&Entry<K, V>> {
        dispatch!(self, b => b.get_entry(key))
    }

    fn remove(&mut self, key: &K) -> Result<Entry<K, V>> {
        dispatch!(self, b => b.remove(key))
    }

    fn entries(&self) -> Vec<&Entry<K, V>> {
        dispatch!(self, b => b.entries())
    }

    fn entries_mut(&mut self) -> Vec<&mut Entry<K, V>> {
        dispatch!(self, b => b.entries_mut())
    }

    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        dispatch!(self, b => b.retain(keep))
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        dispatch!(self, b => b.describe(f))
    }

    fn len(&self) -> usize {
        dispatch!(self, b => b.len())
    }

    fn clear(&mut self) {
        dispatch!(self, b => b.clear())
    }
}
