//! The ordering capability consumed by tree-backed buckets.

use std::cmp::Ordering;

/// A total, stable, strict three-way comparison over keys. Tree buckets use
/// nothing else to place keys, so an oracle must report `Equal` exactly when
/// the keys are `==`.
pub trait OrderOracle<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their own `Ord` implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K> OrderOracle<K> for NaturalOrder
where
    K: Ord + ?Sized,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K, F> OrderOracle<K> for F
where
    K: ?Sized,
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{NaturalOrder, OrderOracle};

    #[test]
    fn natural_order() {
        assert_eq!(Ordering::Less, NaturalOrder.compare(&1, &2));
        assert_eq!(Ordering::Equal, NaturalOrder.compare("b", "b"));
        assert_eq!(Ordering::Greater, NaturalOrder.compare(&9, &2));
    }

    #[test]
    fn closures_are_oracles() {
        let reversed = |a: &i32, b: &i32| b.cmp(a);
        assert_eq!(Ordering::Greater, reversed.compare(&1, &2));
    }
}
