//! A self-balancing (AVL) binary search tree of entries.
//!
//! Nodes own their subtrees exclusively. Every structural operation consumes
//! the subtree root it was called on and returns the root that replaces it,
//! so a rotation anywhere on the path simply flows back up to the caller.
//! Keys are placed by an external [`OrderOracle`]; the tree never looks at
//! `Ord` itself.

use std::{cmp::Ordering, fmt};

use tracing::trace;

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::order::OrderOracle;

type Link<K, V> = Option<Box<TreeNode<K, V>>>;

/// A node of an AVL tree, together with the subtree it roots.
#[derive(Clone, Debug)]
pub struct TreeNode<K, V> {
    entry: Entry<K, V>,

    /// Height of the subtree rooted here. A leaf has height 1, an absent
    /// subtree counts as 0.
    height: usize,

    /// Keys ordered before this node's key.
    left: Link<K, V>,

    /// Keys ordered after this node's key.
    right: Link<K, V>,
}

fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.height)
}

impl<K, V> TreeNode<K, V> {
    /// Creates a one-node tree.
    pub fn new(key: K, value: V) -> Self {
        Self {
            entry: Entry::new(key, value),
            height: 1,
            left: None,
            right: None,
        }
    }

    pub fn entry(&self) -> &Entry<K, V> {
        &self.entry
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn left(&self) -> Option<&TreeNode<K, V>> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&TreeNode<K, V>> {
        self.right.as_deref()
    }

    /// `height(right) - height(left)`.
    pub fn balance(&self) -> isize {
        height(&self.right) as isize - height(&self.left) as isize
    }

    /// The balance factor with the largest magnitude anywhere in this
    /// subtree.
    pub fn max_abs_balance(&self) -> isize {
        [self.left(), self.right()]
            .into_iter()
            .flatten()
            .map(TreeNode::max_abs_balance)
            .fold(self.balance(), |worst, b| {
                if b.abs() > worst.abs() {
                    b
                } else {
                    worst
                }
            })
    }

    /// Number of entries in this subtree.
    pub fn len(&self) -> usize {
        1 + self.left().map_or(0, TreeNode::len)
            + self.right().map_or(0, TreeNode::len)
    }

    /// Entries in key order.
    pub fn entries(&self) -> Vec<&Entry<K, V>> {
        let mut out = Vec::new();
        self.collect_entries(&mut out);
        out
    }

    fn collect_entries<'a>(&'a self, out: &mut Vec<&'a Entry<K, V>>) {
        if let Some(left) = self.left() {
            left.collect_entries(out);
        }
        out.push(&self.entry);
        if let Some(right) = self.right() {
            right.collect_entries(out);
        }
    }

    /// Entries in key order, values open for writing.
    pub fn entries_mut(&mut self) -> Vec<&mut Entry<K, V>> {
        let mut out = Vec::new();
        self.collect_entries_mut(&mut out);
        out
    }

    fn collect_entries_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Entry<K, V>>) {
        let TreeNode {
            entry, left, right, ..
        } = self;
        if let Some(left) = left.as_deref_mut() {
            left.collect_entries_mut(out);
        }
        out.push(entry);
        if let Some(right) = right.as_deref_mut() {
            right.collect_entries_mut(out);
        }
    }

    /// Takes the tree apart, handing back its entries in key order.
    pub fn into_entries(self: Box<Self>) -> Vec<Entry<K, V>> {
        let mut out = Vec::new();
        self.drain_into(&mut out);
        out
    }

    fn drain_into(self: Box<Self>, out: &mut Vec<Entry<K, V>>) {
        let TreeNode {
            entry, left, right, ..
        } = *self;
        if let Some(left) = left {
            left.drain_into(out);
        }
        out.push(entry);
        if let Some(right) = right {
            right.drain_into(out);
        }
    }

    /// Builds a tree from entries already in key order. Each node takes the
    /// middle of its range, so sibling subtrees differ in size by at most
    /// one and the result needs no rotations.
    pub fn from_sorted(mut entries: Vec<Entry<K, V>>) -> Link<K, V> {
        if entries.is_empty() {
            return None;
        }

        let right = entries.split_off(entries.len() / 2 + 1);
        let entry = entries.pop()?;
        let mut node = Box::new(TreeNode {
            entry,
            height: 1,
            left: Self::from_sorted(entries),
            right: Self::from_sorted(right),
        });
        node.update_height();
        Some(node)
    }

    /// Inserts `key` or, when the tree already holds it, overwrites its
    /// value. Returns the new root and the displaced value, if any.
    pub fn insert<O>(
        mut self: Box<Self>,
        key: K,
        value: V,
        oracle: &O,
    ) -> (Box<Self>, Option<V>)
    where
        O: OrderOracle<K> + ?Sized,
    {
        let displaced = match oracle.compare(&key, self.entry.key()) {
            Ordering::Less => {
                let (left, displaced) =
                    Self::insert_into(self.left.take(), key, value, oracle);
                self.left = Some(left);
                displaced
            }
            Ordering::Greater => {
                let (right, displaced) =
                    Self::insert_into(self.right.take(), key, value, oracle);
                self.right = Some(right);
                displaced
            }
            Ordering::Equal => {
                let displaced = self.entry.set_value(value);
                return (self, Some(displaced));
            }
        };

        (self.rebalance(), displaced)
    }

    fn insert_into<O>(
        link: Link<K, V>,
        key: K,
        value: V,
        oracle: &O,
    ) -> (Box<Self>, Option<V>)
    where
        O: OrderOracle<K> + ?Sized,
    {
        match link {
            Some(node) => node.insert(key, value, oracle),
            None => {
                trace!("creating tree leaf");
                (Box::new(Self::new(key, value)), None)
            }
        }
    }

    /// Removes the node holding `key`. Returns the new root (which is `None`
    /// once the last node goes) and the removed entry. When `key` is absent
    /// the tree comes back untouched alongside `KeyNotFound`.
    pub fn remove<O>(
        mut self: Box<Self>,
        key: &K,
        oracle: &O,
    ) -> (Link<K, V>, Result<Entry<K, V>>)
    where
        O: OrderOracle<K> + ?Sized,
    {
        match oracle.compare(key, self.entry.key()) {
            Ordering::Less => {
                let Some(left) = self.left.take() else {
                    return (Some(self), Err(Error::KeyNotFound));
                };
                let (left, removed) = left.remove(key, oracle);
                self.left = left;
                (Some(self.rebalance()), removed)
            }
            Ordering::Greater => {
                let Some(right) = self.right.take() else {
                    return (Some(self), Err(Error::KeyNotFound));
                };
                let (right, removed) = right.remove(key, oracle);
                self.right = right;
                (Some(self.rebalance()), removed)
            }
            Ordering::Equal => {
                let TreeNode {
                    entry, left, right, ..
                } = *self;
                trace!("removing tree node");
                (Self::join(left, right), Ok(entry))
            }
        }
    }

    /// Merges the two subtrees of a removed node. With both present, the
    /// in-order successor (leftmost node on the right) takes the removed
    /// node's place.
    fn join(left: Link<K, V>, right: Link<K, V>) -> Link<K, V> {
        match (left, right) {
            (None, only) | (only, None) => only,
            (Some(left), Some(right)) => {
                let (right, successor) = right.take_leftmost();
                let node = Box::new(TreeNode {
                    entry: successor,
                    height: 1,
                    left: Some(left),
                    right,
                });
                Some(node.rebalance())
            }
        }
    }

    /// Detaches the leftmost node of this subtree, returning what is left of
    /// the subtree and the detached entry.
    fn take_leftmost(mut self: Box<Self>) -> (Link<K, V>, Entry<K, V>) {
        match self.left.take() {
            None => {
                let TreeNode { entry, right, .. } = *self;
                (right, entry)
            }
            Some(left) => {
                let (left, leftmost) = left.take_leftmost();
                self.left = left;
                (Some(self.rebalance()), leftmost)
            }
        }
    }

    fn find<O>(&self, key: &K, oracle: &O) -> Option<&Self>
    where
        O: OrderOracle<K> + ?Sized,
    {
        let mut current = self;
        loop {
            let next = match oracle.compare(key, current.entry.key()) {
                Ordering::Less => current.left(),
                Ordering::Greater => current.right(),
                Ordering::Equal => return Some(current),
            };
            current = next?;
        }
    }

    fn find_mut<O>(&mut self, key: &K, oracle: &O) -> Option<&mut Self>
    where
        O: OrderOracle<K> + ?Sized,
    {
        match oracle.compare(key, self.entry.key()) {
            Ordering::Less => self.left.as_deref_mut()?.find_mut(key, oracle),
            Ordering::Greater => {
                self.right.as_deref_mut()?.find_mut(key, oracle)
            }
            Ordering::Equal => Some(self),
        }
    }

    pub fn get_entry<O>(&self, key: &K, oracle: &O) -> Option<&Entry<K, V>>
    where
        O: OrderOracle<K> + ?Sized,
    {
        self.find(key, oracle).map(|node| &node.entry)
    }

    pub fn get_value<O>(&self, key: &K, oracle: &O) -> Result<&V>
    where
        O: OrderOracle<K> + ?Sized,
    {
        self.get_entry(key, oracle)
            .map(Entry::value)
            .ok_or(Error::KeyNotFound)
    }

    pub fn get_value_mut<O>(&mut self, key: &K, oracle: &O) -> Result<&mut V>
    where
        O: OrderOracle<K> + ?Sized,
    {
        self.find_mut(key, oracle)
            .map(|node| node.entry.value_mut())
            .ok_or(Error::KeyNotFound)
    }

    /// Overwrites the value under an existing key. The shape of the tree
    /// does not change.
    pub fn replace_value<O>(&mut self, key: &K, value: V, oracle: &O) -> Result<V>
    where
        O: OrderOracle<K> + ?Sized,
    {
        self.find_mut(key, oracle)
            .map(|node| node.entry.set_value(value))
            .ok_or(Error::KeyNotFound)
    }

    pub fn contains_key<O>(&self, key: &K, oracle: &O) -> bool
    where
        O: OrderOracle<K> + ?Sized,
    {
        self.find(key, oracle).is_some()
    }

    pub fn contains_pair<O>(&self, key: &K, value: &V, oracle: &O) -> bool
    where
        O: OrderOracle<K> + ?Sized,
        V: PartialEq,
    {
        self.get_entry(key, oracle)
            .is_some_and(|entry| entry.value() == value)
    }

    pub fn entry_digests(&self) -> Vec<u64>
    where
        K: std::hash::Hash,
        V: std::hash::Hash,
    {
        self.entries().into_iter().map(Entry::digest).collect()
    }

    /// Writes every entry of the subtree in key order.
    pub fn describe_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        for entry in self.entries() {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn rotate_left(mut self: Box<Self>) -> Box<Self> {
        let Some(mut pivot) = self.right.take() else {
            return self;
        };
        trace!("rotating tree node left");
        self.right = pivot.left.take();
        self.update_height();
        pivot.left = Some(self);
        pivot.update_height();
        pivot
    }

    fn rotate_right(mut self: Box<Self>) -> Box<Self> {
        let Some(mut pivot) = self.left.take() else {
            return self;
        };
        trace!("rotating tree node right");
        self.left = pivot.right.take();
        self.update_height();
        pivot.right = Some(self);
        pivot.update_height();
        pivot
    }

    /// Restores the AVL property at this node, assuming both subtrees
    /// already satisfy it and differ in height by at most two.
    fn rebalance(mut self: Box<Self>) -> Box<Self> {
        self.update_height();
        let balance = self.balance();

        if balance > 1 {
            // the right side is too tall; an inner-heavy right child needs
            // straightening first
            if let Some(right) = self.right.take() {
                self.right = Some(if right.balance() < 0 {
                    right.rotate_right()
                } else {
                    right
                });
            }
            self = self.rotate_left();
        } else if balance < -1 {
            if let Some(left) = self.left.take() {
                self.left = Some(if left.balance() > 0 {
                    left.rotate_left()
                } else {
                    left
                });
            }
            self = self.rotate_right();
        }

        self
    }

    /// Walks the whole subtree asserting cached heights, the balance bound
    /// and key ordering.
    #[cfg(test)]
    pub(crate) fn continuity_test<O>(&self, oracle: &O)
    where
        O: OrderOracle<K> + ?Sized,
    {
        assert_eq!(
            1 + height(&self.left).max(height(&self.right)),
            self.height,
            "cached height is stale"
        );
        assert!(self.balance().abs() <= 1, "node is out of balance");

        if let Some(left) = self.left() {
            for entry in left.entries() {
                assert_eq!(
                    Ordering::Less,
                    oracle.compare(entry.key(), self.entry.key())
                );
            }
            left.continuity_test(oracle);
        }
        if let Some(right) = self.right() {
            for entry in right.entries() {
                assert_eq!(
                    Ordering::Greater,
                    oracle.compare(entry.key(), self.entry.key())
                );
            }
            right.continuity_test(oracle);
        }
    }
}

/// Trees are equal when they hold the same pairs, however they were built.
/// Entry counts are compared first, which together with the subset check
/// means equal sets; cached heights are not, since equal contents can settle
/// into different shapes.
impl<K, V> PartialEq for TreeNode<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let theirs = other.entries();
        self.entries().into_iter().all(|ours| theirs.contains(&ours))
    }
}

impl<K: Eq, V: Eq> Eq for TreeNode<K, V> {}

impl<K, V> std::hash::Hash for TreeNode<K, V>
where
    K: std::hash::Hash,
    V: std::hash::Hash,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(crate::entry::combine_digests(self.entry_digests()));
    }
}

impl<K, V> fmt::Display for TreeNode<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AVLTree{")?;
        self.describe_tree(f)?;
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::collections::BTreeMap;
    use std::hash::{Hash, Hasher};

    use proptest::prelude::*;
    use rstest::rstest;

    use super::{Link, TreeNode};
    use crate::error::Error;
    use crate::order::NaturalOrder;

    fn insert(root: Link<i32, i32>, key: i32, value: i32) -> Box<TreeNode<i32, i32>> {
        let root = match root {
            Some(node) => node.insert(key, value, &NaturalOrder).0,
            None => Box::new(TreeNode::new(key, value)),
        };
        root.continuity_test(&NaturalOrder);
        root
    }

    fn tree_of(keys: impl IntoIterator<Item = i32>) -> Box<TreeNode<i32, i32>> {
        let mut root = None;
        for key in keys {
            root = Some(insert(root, key, key * 10));
        }
        root.expect("at least one key")
    }

    fn hash_of<T: Hash>(t: &T) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    fn height_bound(n: usize) -> usize {
        (1.45 * ((n + 2) as f64).log2()).ceil() as usize
    }

    #[rstest]
    #[case::single(1)]
    #[case::pair(2)]
    #[case::odd(7)]
    #[case::uneven(100)]
    fn rebuilt_from_sorted_entries_is_balanced(#[case] n: i32) {
        let entries = tree_of(0..n).into_entries();
        let keys: Vec<i32> = entries.iter().map(|e| *e.key()).collect();
        assert_eq!((0..n).collect::<Vec<_>>(), keys);

        let root = TreeNode::from_sorted(entries).expect("entries were given");
        root.continuity_test(&NaturalOrder);
        assert_eq!(n as usize, root.len());
        for key in 0..n {
            assert_eq!(Ok(&(key * 10)), root.get_value(&key, &NaturalOrder));
        }
    }

    #[test]
    fn entries_mut_in_key_order() {
        let mut root = tree_of([5, 1, 9, 3]);
        let keys: Vec<i32> = root.entries_mut().iter().map(|e| *e.key()).collect();
        assert_eq!(vec![1, 3, 5, 9], keys);

        for entry in root.entries_mut() {
            *entry.value_mut() = -1;
        }
        assert!(root.entries().iter().all(|e| *e.value() == -1));
        assert!(TreeNode::<i32, i32>::from_sorted(Vec::new()).is_none());
    }

    #[test]
    fn leaf_height_is_one() {
        let leaf = TreeNode::new(1, 1);
        assert_eq!(1, leaf.height());
        assert_eq!(0, leaf.balance());
        assert_eq!(1, leaf.len());
    }

    #[rstest]
    #[case::right_right(vec![1, 2, 3])]
    #[case::left_left(vec![3, 2, 1])]
    #[case::right_left(vec![1, 3, 2])]
    #[case::left_right(vec![3, 1, 2])]
    fn three_keys_rotate_to_a_perfect_tree(#[case] keys: Vec<i32>) {
        let root = tree_of(keys);

        assert_eq!(2, root.height());
        assert_eq!(&2, root.entry().key());
        assert_eq!(Some(&1), root.left().map(|n| n.entry().key()));
        assert_eq!(Some(&3), root.right().map(|n| n.entry().key()));
    }

    #[test]
    fn insert_existing_key_overwrites_value() {
        let root = tree_of([2, 1, 3]);
        let (root, displaced) = root.insert(3, 99, &NaturalOrder);

        assert_eq!(Some(30), displaced);
        assert_eq!(3, root.len());
        assert_eq!(Ok(&99), root.get_value(&3, &NaturalOrder));
    }

    #[rstest]
    #[case::ascending(1000, false)]
    #[case::descending(1000, true)]
    fn height_stays_logarithmic(#[case] n: i32, #[case] descending: bool) {
        let mut root = None;
        for i in 0..n {
            let key = if descending { n - i } else { i };
            root = Some(insert(root, key, key));
            let len = (i + 1) as usize;
            let node = root.as_deref().expect("tree is non-empty");
            assert!(node.height() <= height_bound(len));
        }
    }

    #[rstest]
    #[case::leaf(1)]
    #[case::one_child(6)]
    #[case::two_children(4)]
    #[case::root(5)]
    fn remove_keeps_order_and_balance(#[case] key: i32) {
        let root = tree_of([5, 3, 8, 2, 4, 7, 9, 1, 6]);

        let (root, removed) = root.remove(&key, &NaturalOrder);
        let removed = removed.expect("key is in the tree");
        assert_eq!((key, key * 10), removed.into_pair());

        let root = root.expect("tree still has nodes");
        root.continuity_test(&NaturalOrder);
        assert_eq!(8, root.len());
        assert!(!root.contains_key(&key, &NaturalOrder));
    }

    #[test]
    fn remove_only_node_empties_tree() {
        let (root, removed) = tree_of([1]).remove(&1, &NaturalOrder);
        assert!(root.is_none());
        assert!(removed.is_ok());
    }

    #[test]
    fn remove_missing_key_leaves_tree_alone() {
        let before = tree_of(1..=10);
        let (after, removed) = before.clone().remove(&42, &NaturalOrder);

        assert_eq!(Err(Error::KeyNotFound), removed);
        let after = after.expect("tree is untouched");
        assert_eq!(before.height(), after.height());
        assert_eq!(before.entries(), after.entries());
    }

    #[test]
    fn lookups() {
        let mut root = tree_of([4, 2, 6]);

        assert_eq!(Ok(&20), root.get_value(&2, &NaturalOrder));
        assert_eq!(Err(Error::KeyNotFound), root.get_value(&5, &NaturalOrder));
        assert!(root.contains_key(&6, &NaturalOrder));
        assert!(!root.contains_key(&7, &NaturalOrder));
        assert!(root.contains_pair(&6, &60, &NaturalOrder));
        assert!(!root.contains_pair(&6, &61, &NaturalOrder));

        assert_eq!(Ok(40), root.replace_value(&4, 44, &NaturalOrder));
        assert_eq!(
            Err(Error::KeyNotFound),
            root.replace_value(&5, 0, &NaturalOrder)
        );
        *root.get_value_mut(&2, &NaturalOrder).expect("key is present") = 22;
        assert!(root.contains_pair(&2, &22, &NaturalOrder));
        assert_eq!(3, root.len());
    }

    #[test]
    fn custom_oracle_orders_keys() {
        let reversed = |a: &i32, b: &i32| b.cmp(a);
        let mut root = Box::new(TreeNode::new(1, ()));
        for key in 2..=5 {
            root = root.insert(key, (), &reversed).0;
        }
        root.continuity_test(&reversed);

        let keys: Vec<i32> = root.entries().iter().map(|e| *e.key()).collect();
        assert_eq!(vec![5, 4, 3, 2, 1], keys);
    }

    #[test]
    fn equality_and_hash_ignore_insertion_history() {
        let ascending = tree_of(1..=7);
        let scrambled = tree_of([4, 7, 1, 6, 2, 5, 3]);
        let fewer = tree_of(1..=6);

        assert_eq!(ascending, scrambled);
        assert_eq!(hash_of(&ascending), hash_of(&scrambled));
        assert_ne!(ascending, fewer);
    }

    #[test]
    fn max_abs_balance() {
        let root = tree_of(1..=20);
        assert!(root.max_abs_balance().abs() <= 1);
        assert_eq!(0, TreeNode::new(1, 1).max_abs_balance());
    }

    #[test]
    fn display() {
        let root = tree_of([2, 1]);
        assert_eq!(
            "AVLTree{{key=1, value=10}{key=2, value=20}}",
            root.to_string()
        );
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i16),
        Remove(i16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<i16>().prop_map(|k| Op::Insert(k % 64)),
            any::<i16>().prop_map(|k| Op::Remove(k % 64)),
        ]
    }

    proptest! {
        #[test]
        fn balance_holds_after_every_operation(
            ops in prop::collection::vec(op(), 0..200)
        ) {
            let mut root: Link<i16, i16> = None;
            let mut model = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(k) => {
                        root = Some(match root.take() {
                            Some(node) => node.insert(k, k, &NaturalOrder).0,
                            None => Box::new(TreeNode::new(k, k)),
                        });
                        model.insert(k, k);
                    }
                    Op::Remove(k) => {
                        if let Some(node) = root.take() {
                            let (rest, removed) = node.remove(&k, &NaturalOrder);
                            root = rest;
                            prop_assert_eq!(model.remove(&k).is_some(), removed.is_ok());
                        }
                    }
                }

                if let Some(node) = root.as_deref() {
                    node.continuity_test(&NaturalOrder);
                    prop_assert_eq!(model.len(), node.len());
                } else {
                    prop_assert!(model.is_empty());
                }
            }
        }
    }
}
