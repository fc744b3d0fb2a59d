//! Block
//!
//! One node of the block chain: a sorted run of pairs plus chain links and
//! cached bounds.
//!
//! ## Record Layout (P = size of one pair)
//! ```text
//! ┌──────────┬─────────┬─────────┬──────────────┬──────────────┐
//! │ Count (4)│ Prev (4)│ Next (4)│ MinElem (P)  │ MaxElem (P)  │  ← BlockHeader
//! ├──────────┴─────────┴─────────┴──────────────┴──────────────┤
//! │ DataLen (8) │ Pair 0 │ Pair 1 │ ... │ (room for CAP + 1)   │
//! └────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::record::{Pair, Record};

/// Byte offset of `count` inside a block record
pub(crate) const COUNT_OFFSET: usize = 0;

/// Byte offset of `prev` inside a block record
pub(crate) const PREV_OFFSET: usize = 4;

/// Count + Prev + Next
const LINK_FIELDS_SIZE: usize = 12;

/// Length prefix bincode writes before the data vector
const LEN_PREFIX_SIZE: usize = 8;

/// A chain block as stored in one record slot
///
/// `count` always equals `data.len()` once written. `min_elem`/`max_elem`
/// mirror the first/last pair and go stale when the block empties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Block<K, V, const CAP: usize> {
    pub count: u32,
    pub prev: u32,
    pub next: u32,
    pub min_elem: Pair<K, V>,
    pub max_elem: Pair<K, V>,
    pub data: Vec<Pair<K, V>>,
}

/// Leading fields of a block, decodable without reading the pairs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct BlockHeader<K, V> {
    pub count: u32,
    pub prev: u32,
    pub next: u32,
    pub min_elem: Pair<K, V>,
    pub max_elem: Pair<K, V>,
}

impl<K: Record, V: Record> Record for BlockHeader<K, V> {
    const SIZE: usize = LINK_FIELDS_SIZE + 2 * Pair::<K, V>::SIZE;
}

impl<K: Record, V: Record, const CAP: usize> Record for Block<K, V, CAP> {
    // one spare pair so an insert may overflow before the split runs
    const SIZE: usize =
        BlockHeader::<K, V>::SIZE + LEN_PREFIX_SIZE + (CAP + 1) * Pair::<K, V>::SIZE;
}

impl<K: Ord + Copy, V: Ord + Copy, const CAP: usize> Block<K, V, CAP> {
    /// Build a block around a non-empty sorted run
    pub fn from_pairs(data: Vec<Pair<K, V>>, prev: u32, next: u32) -> Self {
        debug_assert!(!data.is_empty(), "blocks are created non-empty");
        debug_assert!(data.windows(2).all(|w| w[0] < w[1]));

        let min_elem = data[0];
        let max_elem = data[data.len() - 1];
        Self {
            count: data.len() as u32,
            prev,
            next,
            min_elem,
            max_elem,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Insert in compound order; false if the pair is already present
    pub fn insert(&mut self, pair: Pair<K, V>) -> bool {
        match self.data.binary_search(&pair) {
            Ok(_) => false,
            Err(index) => {
                self.data.insert(index, pair);
                self.refresh();
                true
            }
        }
    }

    /// Remove an exact pair; false if it is absent
    pub fn remove(&mut self, pair: &Pair<K, V>) -> bool {
        match self.data.binary_search(pair) {
            Ok(index) => {
                self.data.remove(index);
                self.refresh();
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, pair: &Pair<K, V>) -> bool {
        self.data.binary_search(pair).is_ok()
    }

    /// Detach the upper half (`[count / 2, count)`) for a new sibling
    pub fn split_upper(&mut self) -> Vec<Pair<K, V>> {
        debug_assert!(self.len() >= 2, "cannot split a block with fewer than 2 pairs");
        let mid = self.len() / 2;
        let upper = self.data.split_off(mid);
        self.refresh();
        upper
    }

    /// Append the right neighbour's pairs and take over its successor link
    pub fn absorb(&mut self, right: Block<K, V, CAP>) {
        debug_assert!(self.len() + right.len() <= CAP, "merge would exceed capacity");
        self.data.extend(right.data);
        self.next = right.next;
        self.refresh();
    }

    /// Append every value stored under `key` to `out`, in ascending order
    pub fn collect_values(&self, key: &K, out: &mut Vec<V>) {
        let start = self.data.partition_point(|p| p.key < *key);
        out.extend(
            self.data[start..]
                .iter()
                .take_while(|p| p.key == *key)
                .map(|p| p.value),
        );
    }

    /// Resync `count` and, for a non-empty block, the cached bounds
    fn refresh(&mut self) {
        self.count = self.data.len() as u32;
        if let (Some(first), Some(last)) = (self.data.first(), self.data.last()) {
            self.min_elem = *first;
            self.max_elem = *last;
        }
    }
}
