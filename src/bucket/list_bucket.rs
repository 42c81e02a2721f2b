use std::fmt;

use super::Bucket;
use crate::chain::ListNode;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// A bucket backed by a singly linked chain. Keys only need `PartialEq`.
#[derive(Clone, Debug)]
pub struct ListBucket<K, V> {
    /// First node of the chain, absent while the bucket is empty.
    head: Option<Box<ListNode<K, V>>>,

    /// Number of nodes in the chain.
    len: usize,
}

impl<K, V> ListBucket<K, V> {
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn head(&self) -> Option<&ListNode<K, V>> {
        self.head.as_deref()
    }

    #[cfg(test)]
    fn continuity_test(&self)
    where
        K: PartialEq,
    {
        let counted = self.head().map_or(0, ListNode::len);
        assert_eq!(self.len, counted, "cached length is stale");

        if let Some(head) = self.head() {
            head.continuity_test();
        }
    }
}

impl<K, V> Default for ListBucket<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for ListBucket<K, V> {
    fn drop(&mut self) {
        ListNode::clear_list(&mut self.head);
    }
}

impl<K, V> Bucket<K, V> for ListBucket<K, V>
where
    K: PartialEq,
{
    fn put(&mut self, key: K, value: V) -> Option<V> {
        let displaced = ListNode::put_into_list(&mut self.head, key, value);
        if displaced.is_none() {
            self.len += 1;
        }

        #[cfg(test)]
        self.continuity_test();

        displaced
    }

    fn replace(&mut self, key: &K, value: V) -> Result<V> {
        self.head
            .as_deref_mut()
            .ok_or(Error::BucketEmpty)?
            .replace_value(key, value)
    }

    fn get(&self, key: &K) -> Result<&V> {
        self.head().ok_or(Error::BucketEmpty)?.get_value(key)
    }

    fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        self.head
            .as_deref_mut()
            .ok_or(Error::BucketEmpty)?
            .get_value_mut(key)
    }

    fn get_entry(&self, key: &K) -> Option<&Entry<K, V>> {
        self.head()?.get_entry(key)
    }

    fn remove(&mut self, key: &K) -> Result<Entry<K, V>> {
        if self.head.is_none() {
            return Err(Error::BucketEmpty);
        }

        let removed = ListNode::remove_from_list(&mut self.head, key)?;
        self.len -= 1;

        #[cfg(test)]
        self.continuity_test();

        Ok(removed)
    }

    fn entries(&self) -> Vec<&Entry<K, V>> {
        self.head().map_or_else(Vec::new, ListNode::entries)
    }

    fn entries_mut(&mut self) -> Vec<&mut Entry<K, V>> {
        self.head
            .as_deref_mut()
            .map_or_else(Vec::new, ListNode::entries_mut)
    }

    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let removed = ListNode::retain_in_list(&mut self.head, keep);
        self.len -= removed;

        #[cfg(test)]
        self.continuity_test();

        removed
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        match self.head() {
            Some(head) => head.describe_list(f),
            None => Ok(()),
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        ListNode::clear_list(&mut self.head);
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::ListBucket;
    use crate::bucket::Bucket;
    use crate::error::Error;

    #[test]
    fn empty_bucket() {
        let mut bucket: ListBucket<u32, u32> = ListBucket::new();

        assert!(bucket.is_empty());
        assert_eq!(Err(Error::BucketEmpty), bucket.get(&1));
        assert_eq!(Err(Error::BucketEmpty), bucket.replace(&1, 1));
        assert_eq!(Err(Error::BucketEmpty), bucket.remove(&1).map(|_| ()));
        assert!(!bucket.contains_key(&1));
        assert!(!bucket.contains_pair(&1, &1));
        assert!(bucket.entries().is_empty());
    }

    #[test]
    fn put_get_remove() {
        let mut bucket = ListBucket::new();

        assert_eq!(None, bucket.put(1, "one"));
        assert_eq!(None, bucket.put(2, "two"));
        assert_eq!(Some("one"), bucket.put(1, "uno"));
        assert_eq!(2, bucket.len());

        assert_eq!(Ok(&"uno"), bucket.get(&1));
        assert_eq!(Err(Error::KeyNotFound), bucket.get(&3));
        assert!(bucket.contains_pair(&2, &"two"));

        assert_eq!(Ok("two"), bucket.replace(&2, "dos"));
        assert_eq!(Err(Error::KeyNotFound), bucket.replace(&3, "tres"));

        let removed = bucket.remove(&1).expect("key is present");
        assert_eq!((1, "uno"), removed.into_pair());
        assert_eq!(Err(Error::KeyNotFound), bucket.remove(&1).map(|_| ()));
        assert_eq!(1, bucket.len());

        bucket.remove(&2).expect("key is present");
        assert!(bucket.is_empty());
        assert!(bucket.head().is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut bucket = ListBucket::new();
        bucket.put(1, 1);
        bucket.put(2, 2);

        bucket.clear();

        assert!(bucket.is_empty());
        assert!(bucket.head().is_none());
        assert_eq!(None, bucket.put(1, 1));
    }

    #[test]
    fn retain_updates_length() {
        let mut bucket = ListBucket::new();
        for k in 0..6 {
            bucket.put(k, k * 10);
        }

        assert_eq!(3, bucket.retain(|k, _| k % 2 == 1));
        assert_eq!(3, bucket.len());
        assert_eq!(Err(Error::KeyNotFound), bucket.get(&2));
        assert_eq!(Ok(&30), bucket.get(&3));

        for entry in bucket.entries_mut() {
            *entry.value_mut() += 1;
        }
        assert!(bucket.contains_pair(&5, &51));
    }
}
