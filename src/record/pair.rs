//! Compound (key, value) element

use serde::{Deserialize, Serialize};

use super::Record;

/// A (key, value) element ordered by key first, then value
///
/// Ordering on the value lets `(key, value)` act as a unique compound key
/// even though the key alone repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Pair<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<Pair<K, V>> for (K, V) {
    fn from(pair: Pair<K, V>) -> Self {
        (pair.key, pair.value)
    }
}

impl<K: Record, V: Record> Record for Pair<K, V> {
    const SIZE: usize = K::SIZE + V::SIZE;
}
