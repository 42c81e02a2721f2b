use thiserror::Error;

/// Everything that can go wrong inside a bucket or while building a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Bad construction arguments, such as a bucket count of zero.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The key is not held by the chain or tree that was searched.
    #[error("key is not present")]
    KeyNotFound,

    /// The bucket has no backing store at all.
    #[error("bucket is empty")]
    BucketEmpty,
}

pub type Result<T> = std::result::Result<T, Error>;
