//! A hasher which just proxies for the integer it's given. Keys that hash
//! themselves with a single integer write (all of the primitive integers, or
//! a type whose `Hash` impl writes one precomputed `u64`) then land in a
//! bucket chosen directly by that integer, which makes routing predictable.
//! Keys made of several writes (strings, tuples) fold every write in, so
//! they still spread out.

use std::hash::{BuildHasher, Hasher};

/// Proxies integers for themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHasher(u64);

/// Odd multiplier that smears the running state before the next write.
const FOLD_MULTIPLIER: u64 = 0x9e37_79b9_7f4a_7c15;

impl NullHasher {
    // a lone write into a fresh hasher comes out unchanged; after that, the
    // running state is mixed so the low bits depend on every earlier write
    fn fold(&mut self, i: u64) {
        self.0 = self.0.wrapping_mul(FOLD_MULTIPLIER).rotate_left(32) ^ i;
    }
}

impl Hasher for NullHasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.fold(u64::from(*byte));
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i));
    }

    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i));
    }

    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i));
    }

    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Builds new NullHashers on demand.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildNullHasher;

impl BuildHasher for BuildNullHasher {
    type Hasher = NullHasher;

    fn build_hasher(&self) -> Self::Hasher {
        NullHasher(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::hash::{BuildHasher, Hash, Hasher};

    use super::{BuildNullHasher, NullHasher};

    #[test]
    fn test_hasher() {
        let mut h0 = NullHasher(0);
        h0.write_u64(0xc8c8c8c8);
        assert_eq!(0xc8c8c8c8, h0.finish());

        let mut h1 = NullHasher(0);
        h1.write_u64(0xc8c8c8c8c8c8c8c8);
        assert_eq!(0xc8c8c8c8c8c8c8c8, h1.finish());
    }

    #[test]
    fn integers_hash_to_themselves() {
        fn hash<T: Hash>(t: T) -> u64 {
            let mut h = BuildNullHasher.build_hasher();
            t.hash(&mut h);
            h.finish()
        }

        assert_eq!(7, hash(7u8));
        assert_eq!(300, hash(300u32));
        assert_eq!(42, hash(42usize));
        assert_eq!(u64::MAX, hash(u64::MAX));
    }

    #[test]
    fn every_write_counts() {
        fn hash<T: Hash>(t: T) -> u64 {
            let mut h = BuildNullHasher.build_hasher();
            t.hash(&mut h);
            h.finish()
        }

        let strings: HashSet<u64> = ["a", "bb", "hello", "world", "zzz"]
            .into_iter()
            .map(|s| hash(s) % 1024)
            .collect();
        assert_eq!(5, strings.len());

        let tuples: HashSet<u64> = [(1, 9), (2, 9), (3, 9)]
            .into_iter()
            .map(|t| hash(t) % 1024)
            .collect();
        assert_eq!(3, tuples.len());

        assert_ne!(hash((1u8, 2u8)), hash((2u8, 1u8)));
    }

    #[test]
    fn byte_writes_are_deterministic() {
        let mut a = NullHasher::default();
        let mut b = NullHasher::default();
        a.write(b"bucket");
        b.write(b"bucket");
        assert_eq!(a.finish(), b.finish());
    }
}
