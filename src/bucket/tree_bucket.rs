use std::fmt;

use super::Bucket;
use crate::avl_tree::TreeNode;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::order::{NaturalOrder, OrderOracle};

/// A bucket backed by an AVL tree. Keys are placed by the bucket's order
/// oracle, so lookups in a crowded bucket stay logarithmic.
#[derive(Clone, Debug)]
pub struct TreeBucket<K, V, O = NaturalOrder> {
    root: Option<Box<TreeNode<K, V>>>,
    len: usize,
    oracle: O,
}

impl<K, V> TreeBucket<K, V, NaturalOrder>
where
    K: Ord,
{
    pub fn new() -> Self {
        Self::with_oracle(NaturalOrder)
    }
}

impl<K, V> Default for TreeBucket<K, V, NaturalOrder>
where
    K: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, O> TreeBucket<K, V, O>
where
    O: OrderOracle<K>,
{
    /// Creates an empty bucket ordering its keys with `oracle`.
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            root: None,
            len: 0,
            oracle,
        }
    }

    pub fn root(&self) -> Option<&TreeNode<K, V>> {
        self.root.as_deref()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Height of the tree, 0 while empty.
    pub fn height(&self) -> usize {
        self.root().map_or(0, TreeNode::height)
    }

    /// The worst balance factor in the tree; always within `-1..=1`.
    pub fn max_abs_balance(&self) -> isize {
        self.root().map_or(0, TreeNode::max_abs_balance)
    }

    #[cfg(test)]
    fn continuity_test(&self) {
        assert_eq!(
            self.len,
            self.root().map_or(0, TreeNode::len),
            "cached length is stale"
        );

        if let Some(root) = self.root() {
            root.continuity_test(&self.oracle);
        }
    }
}

impl<K, V, O> Bucket<K, V> for TreeBucket<K, V, O>
where
    O: OrderOracle<K>,
{
    fn put(&mut self, key: K, value: V) -> Option<V> {
        let (root, displaced) = match self.root.take() {
            Some(root) => root.insert(key, value, &self.oracle),
            None => (Box::new(TreeNode::new(key, value)), None),
        };
        self.root = Some(root);

        if displaced.is_none() {
            self.len += 1;
        }

        #[cfg(test)]
        self.continuity_test();

        displaced
    }

    fn replace(&mut self, key: &K, value: V) -> Result<V> {
        self.root
            .as_deref_mut()
            .ok_or(Error::BucketEmpty)?
            .replace_value(key, value, &self.oracle)
    }

    fn get(&self, key: &K) -> Result<&V> {
        self.root()
            .ok_or(Error::BucketEmpty)?
            .get_value(key, &self.oracle)
    }

    fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        self.root
            .as_deref_mut()
            .ok_or(Error::BucketEmpty)?
            .get_value_mut(key, &self.oracle)
    }

    fn get_entry(&self, key: &K) -> Option<&Entry<K, V>> {
        self.root()?.get_entry(key, &self.oracle)
    }

    fn remove(&mut self, key: &K) -> Result<Entry<K, V>> {
        let root = self.root.take().ok_or(Error::BucketEmpty)?;
        let (root, removed) = root.remove(key, &self.oracle);
        self.root = root;

        let removed = removed?;
        self.len -= 1;

        #[cfg(test)]
        self.continuity_test();

        Ok(removed)
    }

    fn entries(&self) -> Vec<&Entry<K, V>> {
        self.root().map_or_else(Vec::new, TreeNode::entries)
    }

    fn entries_mut(&mut self) -> Vec<&mut Entry<K, V>> {
        self.root
            .as_deref_mut()
            .map_or_else(Vec::new, TreeNode::entries_mut)
    }

    /// Drains the tree, filters the entries in key order and rebuilds a
    /// balanced tree from the survivors.
    fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let Some(root) = self.root.take() else {
            return 0;
        };

        let mut kept = root.into_entries();
        kept.retain_mut(|entry| {
            let (key, value) = entry.pair_mut();
            keep(key, value)
        });

        let removed = self.len - kept.len();
        self.len = kept.len();
        self.root = TreeNode::from_sorted(kept);

        #[cfg(test)]
        self.continuity_test();

        removed
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        match self.root() {
            Some(root) => root.describe_tree(f),
            None => Ok(()),
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::TreeBucket;
    use crate::bucket::Bucket;
    use crate::error::Error;

    #[test]
    fn empty_bucket() {
        let mut bucket: TreeBucket<u32, u32> = TreeBucket::new();

        assert!(bucket.is_empty());
        assert_eq!(0, bucket.height());
        assert_eq!(Err(Error::BucketEmpty), bucket.get(&1));
        assert_eq!(Err(Error::BucketEmpty), bucket.replace(&1, 1));
        assert_eq!(Err(Error::BucketEmpty), bucket.remove(&1).map(|_| ()));
        assert!(!bucket.contains_key(&1));
    }

    #[test]
    fn put_get_remove() {
        let mut bucket = TreeBucket::new();

        for key in 0..100u32 {
            assert_eq!(None, bucket.put(key, key));
        }
        assert_eq!(Some(7), bucket.put(7, 700));
        assert_eq!(100, bucket.len());
        assert!(bucket.height() <= 10);
        assert!(bucket.max_abs_balance().abs() <= 1);

        assert_eq!(Ok(&700), bucket.get(&7));
        assert_eq!(Err(Error::KeyNotFound), bucket.get(&100));
        assert_eq!(Ok(8), bucket.replace(&8, 800));
        assert!(bucket.contains_pair(&8, &800));

        for key in (0..100u32).step_by(2) {
            bucket.remove(&key).expect("key is present");
        }
        assert_eq!(50, bucket.len());
        assert_eq!(Err(Error::KeyNotFound), bucket.remove(&0).map(|_| ()));
        assert_eq!(50, bucket.len());

        let keys: Vec<u32> = bucket.entries().iter().map(|e| *e.key()).collect();
        assert_eq!((1..100).step_by(2).collect::<Vec<u32>>(), keys);
    }

    #[test]
    fn last_removal_empties_root() {
        let mut bucket = TreeBucket::new();
        bucket.put("k", 1);
        bucket.remove(&"k").expect("key is present");

        assert!(bucket.root().is_none());
        assert_eq!(Err(Error::BucketEmpty), bucket.get(&"k"));
    }

    #[test]
    fn clear_drops_everything() {
        let mut bucket = TreeBucket::new();
        bucket.put(1, 1);
        bucket.put(2, 2);

        bucket.clear();

        assert!(bucket.is_empty());
        assert!(bucket.root().is_none());
    }

    #[test]
    fn retain_rebuilds_a_balanced_tree() {
        let mut bucket = TreeBucket::new();
        for key in 0..64u32 {
            bucket.put(key, key);
        }

        assert_eq!(48, bucket.retain(|k, v| {
            *v += 1;
            k % 4 == 0
        }));

        assert_eq!(16, bucket.len());
        assert!(bucket.max_abs_balance().abs() <= 1);
        assert_eq!(Ok(&9), bucket.get(&8));
        assert_eq!(Err(Error::KeyNotFound), bucket.get(&9));

        assert_eq!(16, bucket.retain(|_, _| false));
        assert!(bucket.root().is_none());
        assert_eq!(0, bucket.retain(|_, _| true));
    }

    #[test]
    fn entries_mut_edits_in_place() {
        let mut bucket = TreeBucket::new();
        bucket.put("b", 2);
        bucket.put("a", 1);

        for entry in bucket.entries_mut() {
            *entry.value_mut() *= 10;
        }

        assert!(bucket.contains_pair(&"a", &10));
        assert!(bucket.contains_pair(&"b", &20));
    }
}
