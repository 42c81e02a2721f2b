//! A singly linked chain of entries. Every node owns its successor outright,
//! so a chain is a plain `Option<Box<ListNode>>` rooted in its bucket.
//!
//! Operations that can change the head take the head slot itself rather than
//! a node, and walk it iteratively so long chains do not grow the stack.
//! That includes tearing a chain down: owners release it through
//! [`ListNode::clear_list`] instead of letting the boxes drop recursively.

use std::fmt;

use tracing::trace;

use crate::entry::Entry;
use crate::error::{Error, Result};

/// A node that lives in a chain.
pub struct ListNode<K, V> {
    /// The pair being stored.
    entry: Entry<K, V>,

    /// The rest of the chain.
    next: Option<Box<ListNode<K, V>>>,
}

impl<K, V> ListNode<K, V> {
    /// Creates a chain of exactly one node.
    pub fn new(key: K, value: V) -> Self {
        Self {
            entry: Entry::new(key, value),
            next: None,
        }
    }

    pub fn entry(&self) -> &Entry<K, V> {
        &self.entry
    }

    pub fn next(&self) -> Option<&ListNode<K, V>> {
        self.next.as_deref()
    }

    /// Walks the chain starting at this node.
    pub fn iter(&self) -> ChainIter<'_, K, V> {
        ChainIter { node: Some(self) }
    }

    /// Number of nodes from here to the tail.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Entries from this node to the tail, in chain order.
    pub fn entries(&self) -> Vec<&Entry<K, V>> {
        self.iter().collect()
    }

    pub fn entries_mut(&mut self) -> Vec<&mut Entry<K, V>> {
        let mut out = Vec::new();
        let mut current = Some(self);

        while let Some(node) = current {
            out.push(&mut node.entry);
            current = node.next.as_deref_mut();
        }

        out
    }

    /// Overwrites the value under `key` if the chain holds it, otherwise
    /// appends a new node at the tail. Returns the displaced value, so `None`
    /// means a node was added.
    pub fn put_into_list(
        head: &mut Option<Box<ListNode<K, V>>>,
        key: K,
        value: V,
    ) -> Option<V>
    where
        K: PartialEq,
    {
        let mut cursor = head;

        while let Some(node) = cursor {
            if node.entry.has_key(&key) {
                return Some(node.entry.set_value(value));
            }
            cursor = &mut node.next;
        }

        trace!("appending node to chain tail");
        *cursor = Some(Box::new(ListNode::new(key, value)));
        None
    }

    /// Unlinks the node holding `key`. When that node is the head its
    /// successor becomes the new head, which may leave the slot empty.
    pub fn remove_from_list(
        head: &mut Option<Box<ListNode<K, V>>>,
        key: &K,
    ) -> Result<Entry<K, V>>
    where
        K: PartialEq,
    {
        let mut cursor = head;

        while cursor.as_ref().is_some_and(|node| !node.entry.has_key(key)) {
            cursor = &mut cursor.as_mut().ok_or(Error::KeyNotFound)?.next;
        }

        let mut removed = cursor.take().ok_or(Error::KeyNotFound)?;
        *cursor = removed.next.take();
        trace!("unlinked node from chain");

        Ok(removed.entry)
    }

    /// Keeps only the nodes whose pair satisfies `keep`, in their original
    /// order. Returns how many nodes were dropped.
    pub fn retain_in_list<F>(head: &mut Option<Box<ListNode<K, V>>>, mut keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut rest = head.take();
        let mut tail = head;
        let mut removed = 0;

        while let Some(mut node) = rest {
            rest = node.next.take();
            let (key, value) = node.entry.pair_mut();
            if keep(key, value) {
                tail = &mut tail.insert(node).next;
            } else {
                removed += 1;
            }
        }

        if removed > 0 {
            trace!(removed, "dropped nodes from chain");
        }
        removed
    }

    /// Drops the whole chain one node at a time, leaving the slot empty.
    pub fn clear_list(head: &mut Option<Box<ListNode<K, V>>>) {
        let mut rest = head.take();
        while let Some(mut node) = rest {
            rest = node.next.take();
        }
    }

    pub fn get_entry(&self, key: &K) -> Option<&Entry<K, V>>
    where
        K: PartialEq,
    {
        self.iter().find(|entry| entry.has_key(key))
    }

    pub fn get_entry_mut(&mut self, key: &K) -> Option<&mut Entry<K, V>>
    where
        K: PartialEq,
    {
        let mut current = Some(self);

        while let Some(node) = current {
            if node.entry.has_key(key) {
                return Some(&mut node.entry);
            }
            current = node.next.as_deref_mut();
        }

        None
    }

    pub fn get_value(&self, key: &K) -> Result<&V>
    where
        K: PartialEq,
    {
        self.get_entry(key)
            .map(Entry::value)
            .ok_or(Error::KeyNotFound)
    }

    pub fn get_value_mut(&mut self, key: &K) -> Result<&mut V>
    where
        K: PartialEq,
    {
        self.get_entry_mut(key)
            .map(Entry::value_mut)
            .ok_or(Error::KeyNotFound)
    }

    /// Overwrites the value under an existing key; the chain length never
    /// changes.
    pub fn replace_value(&mut self, key: &K, value: V) -> Result<V>
    where
        K: PartialEq,
    {
        self.get_entry_mut(key)
            .map(|entry| entry.set_value(value))
            .ok_or(Error::KeyNotFound)
    }

    pub fn contains_key(&self, key: &K) -> bool
    where
        K: PartialEq,
    {
        self.get_entry(key).is_some()
    }

    /// True only when the chain holds `key` mapped to exactly `value`.
    pub fn contains_pair(&self, key: &K, value: &V) -> bool
    where
        K: PartialEq,
        V: PartialEq,
    {
        self.get_entry(key).is_some_and(|entry| entry.value() == value)
    }

    pub fn entry_digests(&self) -> Vec<u64>
    where
        K: std::hash::Hash,
        V: std::hash::Hash,
    {
        self.iter().map(Entry::digest).collect()
    }

    /// Writes every entry from here to the tail, comma separated.
    pub fn describe_list(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        for (i, entry) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn continuity_test(&self)
    where
        K: PartialEq,
    {
        // keys are unique along the chain
        let entries = self.entries();
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                assert!(!b.has_key(a.key()), "chain holds a duplicate key");
            }
        }
    }
}

// Built back to front so no call ever recurses along the chain.
impl<K: Clone, V: Clone> Clone for ListNode<K, V> {
    fn clone(&self) -> Self {
        let entries = self.entries();
        let mut next = None;
        for entry in entries.iter().skip(1).rev() {
            next = Some(Box::new(ListNode {
                entry: (*entry).clone(),
                next,
            }));
        }

        ListNode {
            entry: self.entry.clone(),
            next,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ListNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Two chains are equal when they hold the same pairs, whatever their order.
impl<K, V> PartialEq for ListNode<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|entry| other.contains_pair(entry.key(), entry.value()))
    }
}

impl<K: Eq, V: Eq> Eq for ListNode<K, V> {}

impl<K, V> std::hash::Hash for ListNode<K, V>
where
    K: std::hash::Hash,
    V: std::hash::Hash,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(crate::entry::combine_digests(self.entry_digests()));
    }
}

impl<K, V> fmt::Display for ListNode<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("List{")?;
        self.describe_list(f)?;
        f.write_str("}")
    }
}

/// Iterates the entries of a chain, head first.
pub struct ChainIter<'a, K, V> {
    node: Option<&'a ListNode<K, V>>,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(&node.entry)
    }
}
