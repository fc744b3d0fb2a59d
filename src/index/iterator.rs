//! Chain Iterator
//!
//! Sequential iteration over every pair in an index.

use crate::error::Result;
use crate::record::{Pair, Record};

use super::block_index::BlockIndex;

/// Iterator over index pairs in compound order
///
/// Holds one decoded block at a time and follows `next` links lazily.
/// A read error, or a chain longer than the allocated slots, is yielded
/// once and ends the iteration.
pub struct ChainIter<'a, K, V, const CAP: usize>
where
    K: Record + Ord + Copy,
    V: Record + Ord + Copy,
{
    index: &'a mut BlockIndex<K, V, CAP>,
    /// Pairs of the current block not yet yielded
    pending: std::vec::IntoIter<Pair<K, V>>,
    /// Position of the block to load next (0 = end of chain)
    next_block: u32,
    /// Blocks loaded so far
    steps: usize,
}

impl<'a, K, V, const CAP: usize> ChainIter<'a, K, V, CAP>
where
    K: Record + Ord + Copy,
    V: Record + Ord + Copy,
{
    pub(super) fn new(index: &'a mut BlockIndex<K, V, CAP>, head: u32) -> Self {
        Self {
            index,
            pending: Vec::new().into_iter(),
            next_block: head,
            steps: 0,
        }
    }
}

impl<'a, K, V, const CAP: usize> Iterator for ChainIter<'a, K, V, CAP>
where
    K: Record + Ord + Copy,
    V: Record + Ord + Copy,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.pending.next() {
                return Some(Ok(pair.into()));
            }

            // Stop at end of chain
            if self.next_block == 0 {
                return None;
            }

            if let Err(e) = self.index.guard_walk(&mut self.steps) {
                self.next_block = 0;
                return Some(Err(e));
            }

            match self.index.read_block(self.next_block) {
                Ok(block) => {
                    self.next_block = block.next;
                    self.pending = block.data.into_iter();
                }
                Err(e) => {
                    self.next_block = 0;
                    return Some(Err(e));
                }
            }
        }
    }
}
