//! A hash map with a fixed number of buckets, where each bucket keeps its
//! colliding entries in a pluggable backing store: a singly linked chain or
//! a self-balancing AVL tree.
//!
//! ```
//! use bucket_map::{BasicBucketFactory, BucketKind, BucketMap};
//!
//! let mut map = BucketMap::new(BasicBucketFactory::new(BucketKind::AvlTree));
//! map.put("answer", 42);
//! assert_eq!(Some(&42), map.get(&"answer"));
//! assert_eq!(Some(42), map.remove(&"answer"));
//! assert!(map.is_empty());
//! ```

pub mod avl_tree;
pub mod bucket;
pub mod bucket_map;
pub mod chain;
pub mod entry;
pub mod error;
pub mod map;
pub mod null_hasher;
pub mod order;

#[cfg(feature = "shared_map")]
pub mod shared_map;

pub use bucket::{
    AnyBucket, BasicBucketFactory, Bucket, BucketFactory, BucketKind,
    ListBucket, TreeBucket,
};
pub use bucket_map::{BucketMap, DEFAULT_BUCKET_COUNT};
pub use entry::Entry;
pub use error::{Error, Result};
pub use map::Map;
pub use null_hasher::{BuildNullHasher, NullHasher};
pub use order::{NaturalOrder, OrderOracle};

#[cfg(feature = "shared_map")]
pub use shared_map::SharedMap;
